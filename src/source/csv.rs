//! CSV record reader.

use std::io::Read;
use std::path::Path;

use crate::error::SourceResult;
use crate::types::Record;

use super::check_record;

/// Read records from a CSV file.
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must include `id`, `label`, `category` and `value` (order can differ; extra columns
///   are ignored).
/// - `value` must parse as a finite float.
pub fn read_csv_from_path(path: impl AsRef<Path>) -> SourceResult<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    read_csv_from_reader(&mut rdr)
}

/// Read records from an existing CSV reader.
pub fn read_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> SourceResult<Vec<Record>> {
    let mut records = Vec::new();
    for (row_idx0, result) in rdr.deserialize::<Record>().enumerate() {
        // 1-based, and the header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        check_record(user_row, &record)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::read_csv_from_reader;
    use crate::error::SourceError;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes())
    }

    #[test]
    fn reads_columns_in_any_order() {
        let data = "value,category,id,label\n2.5,a,1,first\n4,b,2,second\n";
        let records = read_csv_from_reader(&mut reader(data)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].label, "first");
        assert_eq!(records[1].category, "b");
        assert_eq!(records[1].value, 4.0);
    }

    #[test]
    fn missing_column_is_a_csv_error() {
        let data = "id,label,value\n1,a,1.0\n";
        assert!(matches!(
            read_csv_from_reader(&mut reader(data)),
            Err(SourceError::Csv(_))
        ));
    }

    #[test]
    fn nan_value_reports_its_row() {
        let data = "id,label,category,value\n1,a,x,1.0\n2,b,x,NaN\n";
        match read_csv_from_reader(&mut reader(data)) {
            Err(SourceError::InvalidRecord { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected invalid record, got {other:?}"),
        }
    }
}
