//! Seeded synthetic record generator.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};
use crate::types::Record;

/// Generates `count` records deterministically from `seed`.
///
/// Record `i` (1-based) gets id `i`, label `record_<i>`, a uniformly chosen category and a value
/// drawn uniformly from `[0, max_value)`. The same settings always produce the same records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordGenerator {
    pub count: usize,
    pub seed: u64,
    pub categories: Vec<String>,
    pub max_value: f64,
}

impl Default for RecordGenerator {
    fn default() -> Self {
        Self {
            count: 1_000,
            seed: 42,
            categories: ["alpha", "beta", "gamma", "delta"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_value: 1_000.0,
        }
    }
}

impl RecordGenerator {
    pub fn new(count: usize, seed: u64) -> Self {
        Self {
            count,
            seed,
            ..Self::default()
        }
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_value(mut self, max_value: f64) -> Self {
        self.max_value = max_value;
        self
    }

    pub fn generate(&self) -> SourceResult<Vec<Record>> {
        if self.categories.is_empty() {
            return Err(SourceError::InvalidGenerator {
                message: "at least one category is required".to_string(),
            });
        }
        if !(self.max_value.is_finite() && self.max_value > 0.0) {
            return Err(SourceError::InvalidGenerator {
                message: format!("max_value must be finite and > 0, got {}", self.max_value),
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let records = (1..=self.count)
            .map(|i| {
                let category = &self.categories[rng.gen_range(0..self.categories.len())];
                let value = rng.gen_range(0.0..self.max_value);
                Record::new(i as i64, format!("record_{i}"), category.as_str(), value)
            })
            .collect();
        Ok(records)
    }
}
