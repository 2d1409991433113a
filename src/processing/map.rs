//! Record mapping.

use std::fmt::Display;

use crate::error::TaskError;

/// Returns a new vector by applying `mapper` to every element, preserving order.
pub fn map<T, U, F>(records: &[T], mapper: F) -> Vec<U>
where
    F: FnMut(&T) -> U,
{
    records.iter().map(mapper).collect()
}

/// Fallible variant of [`map`]. Stops at the first failing element.
///
/// `offset` is the position of `records[0]` in the original sequence and is only used to
/// report which element failed.
pub fn try_map<T, U, E, F>(records: &[T], offset: usize, mut mapper: F) -> Result<Vec<U>, TaskError>
where
    E: Display,
    F: FnMut(&T) -> Result<U, E>,
{
    let mut out = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        match mapper(record) {
            Ok(v) => out.push(v),
            Err(e) => {
                return Err(TaskError::new(format!(
                    "transform failed at element {}: {e}",
                    offset + i
                )));
            }
        }
    }
    Ok(out)
}
