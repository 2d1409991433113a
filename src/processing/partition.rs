//! Two-way partitioning by predicate.

use serde::{Deserialize, Serialize};

/// The two sides of a partition, each in original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partitioned<T> {
    /// Elements for which the predicate returned `true`.
    pub matching: Vec<T>,
    /// Elements for which the predicate returned `false`.
    pub rest: Vec<T>,
}

impl<T> Default for Partitioned<T> {
    fn default() -> Self {
        Self {
            matching: Vec::new(),
            rest: Vec::new(),
        }
    }
}

/// Split `records` into (matching, rest).
pub fn partition<T, F>(records: &[T], mut predicate: F) -> Partitioned<T>
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    let mut out = Partitioned::default();
    for record in records {
        if predicate(record) {
            out.matching.push(record.clone());
        } else {
            out.rest.push(record.clone());
        }
    }
    out
}

/// Concatenate each side across chunks, in chunk order.
pub fn merge_partitions<T>(partials: impl IntoIterator<Item = Partitioned<T>>) -> Partitioned<T> {
    let mut merged = Partitioned::default();
    for mut p in partials {
        merged.matching.append(&mut p.matching);
        merged.rest.append(&mut p.rest);
    }
    merged
}
