//! Core data model types.
//!
//! The engine processes an ordered, read-only sequence of [`Record`]s. Work is split into
//! [`Chunk`]s and each chunk yields a [`PartialResult`] that is merged in chunk order.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A single immutable input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier.
    pub id: i64,
    /// Human-readable label.
    pub label: String,
    /// Grouping category.
    pub category: String,
    /// Numeric payload.
    pub value: f64,
}

impl Record {
    /// Create a new record.
    pub fn new(id: i64, label: impl Into<String>, category: impl Into<String>, value: f64) -> Self {
        Self {
            id,
            label: label.into(),
            category: category.into(),
            value,
        }
    }
}

/// A typed aggregate value produced by grouped aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 64-bit signed integer (counts).
    Int64(i64),
    /// 64-bit float (sums, means, extrema).
    Float64(f64),
}

impl Value {
    /// Numeric view of the value.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Int64(v) => v as f64,
            Value::Float64(v) => v,
        }
    }
}

/// A contiguous, non-overlapping view over the input sequence.
///
/// `index` is the chunk's position among its siblings and doubles as the merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    /// Position of this chunk in the dispatch (ascending original order).
    pub index: usize,
    /// First element (inclusive).
    pub start: usize,
    /// Last element (exclusive).
    pub end: usize,
}

impl Chunk {
    /// Create a chunk covering `start..end`.
    pub fn new(index: usize, start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "chunk start {start} is past end {end}");
        Self { index, start, end }
    }

    /// Element range covered by the chunk.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Number of elements in the chunk.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the chunk covers no elements.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The output of one operation over one chunk, tagged with the chunk index.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialResult<T> {
    /// Index of the chunk that produced `value`.
    pub chunk: usize,
    /// Per-chunk output.
    pub value: T,
}

impl<T> PartialResult<T> {
    pub fn new(chunk: usize, value: T) -> Self {
        Self { chunk, value }
    }
}
