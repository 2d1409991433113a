//! Summary statistics (count, sum, min, max, mean) computed in one pass.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Running summary over a sequence of `f64` values.
///
/// Sums use Neumaier compensation so that merging chunk summaries in a different grouping
/// stays close to the single-pass sum. The mean is always derived from the total sum and the
/// total count, so merged means are weighted by chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Statistics {
    count: u64,
    sum: f64,
    compensation: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Statistics {
    /// Empty summary (count 0, sum 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value.
    pub fn accept(&mut self, value: f64) {
        self.count += 1;
        self.add_compensated(value);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Combine with the summary of another (disjoint) part of the input.
    pub fn combine(mut self, other: Statistics) -> Self {
        self.count += other.count;
        self.add_compensated(other.sum);
        self.add_compensated(other.compensation);
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self
    }

    /// Number of values seen.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sum of all values (0 for an empty summary).
    pub fn sum(&self) -> f64 {
        let total = self.sum + self.compensation;
        if total.is_nan() && self.sum.is_infinite() {
            self.sum
        } else {
            total
        }
    }

    /// Arithmetic mean, or 0 for an empty summary.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum() / self.count as f64
        }
    }

    /// Smallest value seen.
    pub fn min(&self) -> PipelineResult<f64> {
        self.min
            .ok_or(PipelineError::EmptyAggregate { aggregate: "min" })
    }

    /// Largest value seen.
    pub fn max(&self) -> PipelineResult<f64> {
        self.max
            .ok_or(PipelineError::EmptyAggregate { aggregate: "max" })
    }

    fn add_compensated(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }
}

/// Summarize `records`, extracting each numeric value with `value`.
pub fn statistics<T, V>(records: &[T], mut value: V) -> Statistics
where
    V: FnMut(&T) -> f64,
{
    let mut stats = Statistics::new();
    for record in records {
        stats.accept(value(record));
    }
    stats
}

/// Merge per-chunk summaries in chunk order.
pub fn merge_statistics(partials: impl IntoIterator<Item = Statistics>) -> Statistics {
    partials
        .into_iter()
        .fold(Statistics::new(), Statistics::combine)
}
