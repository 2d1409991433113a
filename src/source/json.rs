//! JSON record reader.
//!
//! Supported inputs:
//! - A JSON array of record objects: `[{"id":1,...}, {"id":2,...}]`
//! - Newline-delimited JSON (NDJSON): one record object per line

use std::fs;
use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::types::Record;

use super::check_record;

/// Read records from a JSON or NDJSON file.
pub fn read_json_from_path(path: impl AsRef<Path>) -> SourceResult<Vec<Record>> {
    let text = fs::read_to_string(path)?;
    read_json_from_str(&text)
}

/// Read records from an in-memory JSON array or NDJSON string.
///
/// Blank input and blank NDJSON lines yield no records.
pub fn read_json_from_str(input: &str) -> SourceResult<Vec<Record>> {
    let trimmed = input.trim();
    if trimmed.starts_with('[') {
        let records: Vec<Record> = serde_json::from_str(trimmed)?;
        for (idx0, record) in records.iter().enumerate() {
            check_record(idx0 + 1, record)?;
        }
        return Ok(records);
    }

    let mut records = Vec::new();
    for (idx0, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = idx0 + 1;
        let record: Record = serde_json::from_str(line).map_err(|e| SourceError::InvalidRecord {
            row,
            message: format!("invalid ndjson: {e}"),
        })?;
        check_record(row, &record)?;
        records.push(record);
    }
    Ok(records)
}
