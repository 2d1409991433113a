//! Record sources: a seeded synthetic generator and CSV / JSON readers.
//!
//! Most callers should use [`load_from_path`], which picks the reader from the file extension:
//!
//! - `.csv`: headers `id,label,category,value`, in any column order
//! - `.json`: an array of record objects, or NDJSON
//! - `.ndjson`: one record object per line
//!
//! Every reader rejects records whose `value` is NaN or infinite with
//! [`SourceError::InvalidRecord`], so downstream statistics stay well defined.

pub mod csv;
pub mod generate;
pub mod json;

use std::path::Path;

use crate::error::{SourceError, SourceResult};
use crate::types::Record;

pub use self::csv::{read_csv_from_path, read_csv_from_reader};
pub use self::generate::RecordGenerator;
pub use self::json::{read_json_from_path, read_json_from_str};

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    /// JSON array-of-objects or NDJSON.
    Json,
}

impl RecordFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Load records from `path`, choosing the reader by extension.
///
/// ```no_run
/// use rust_parallel_pipeline::source::load_from_path;
///
/// # fn main() -> Result<(), rust_parallel_pipeline::SourceError> {
/// let records = load_from_path("records.csv")?;
/// println!("rows={}", records.len());
/// # Ok(())
/// # }
/// ```
pub fn load_from_path(path: impl AsRef<Path>) -> SourceResult<Vec<Record>> {
    let path = path.as_ref();
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(RecordFormat::from_extension)
        .ok_or_else(|| SourceError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

    let records = match format {
        RecordFormat::Csv => read_csv_from_path(path)?,
        RecordFormat::Json => read_json_from_path(path)?,
    };
    tracing::debug!(path = %path.display(), ?format, rows = records.len(), "records loaded");
    Ok(records)
}

/// Reject a decoded record that violates the record invariants. `row` is 1-based.
pub(crate) fn check_record(row: usize, record: &Record) -> SourceResult<()> {
    if !record.value.is_finite() {
        return Err(SourceError::InvalidRecord {
            row,
            message: format!("value must be finite, got {}", record.value),
        });
    }
    Ok(())
}
