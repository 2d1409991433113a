//! Grouped aggregation.
//!
//! Each chunk builds its own local `key -> Statistics` map; the engine merges the maps after all
//! chunks finish, combining per-key summaries with [`Statistics::combine`]. No concurrent map is
//! involved.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;
use crate::types::Value;

use super::stats::Statistics;

/// Aggregate to report for each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// Number of elements in the group ([`Value::Int64`]).
    Count,
    /// Sum of values.
    Sum,
    /// Mean of values (weighted recombination across chunks).
    Mean,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
}

impl AggregateKind {
    /// Extract this aggregate from a group summary.
    pub fn finish(self, stats: &Statistics) -> PipelineResult<Value> {
        Ok(match self {
            AggregateKind::Count => Value::Int64(stats.count() as i64),
            AggregateKind::Sum => Value::Float64(stats.sum()),
            AggregateKind::Mean => Value::Float64(stats.mean()),
            AggregateKind::Min => Value::Float64(stats.min()?),
            AggregateKind::Max => Value::Float64(stats.max()?),
        })
    }
}

/// Build a local `key -> Statistics` map over `records`.
pub fn group_statistics<T, K, KF, VF>(records: &[T], mut key: KF, mut value: VF) -> BTreeMap<K, Statistics>
where
    K: Ord,
    KF: FnMut(&T) -> K,
    VF: FnMut(&T) -> f64,
{
    let mut groups: BTreeMap<K, Statistics> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().accept(value(record));
    }
    groups
}

/// Merge per-chunk group maps in chunk order.
pub fn merge_groups<K: Ord>(
    partials: impl IntoIterator<Item = BTreeMap<K, Statistics>>,
) -> BTreeMap<K, Statistics> {
    let mut merged: BTreeMap<K, Statistics> = BTreeMap::new();
    for partial in partials {
        for (k, stats) in partial {
            let slot = merged.entry(k).or_default();
            *slot = slot.combine(stats);
        }
    }
    merged
}

/// Reduce merged group summaries to the requested aggregate.
pub fn finish_groups<K: Ord>(
    groups: BTreeMap<K, Statistics>,
    kind: AggregateKind,
) -> PipelineResult<BTreeMap<K, Value>> {
    groups
        .into_iter()
        .map(|(k, stats)| -> PipelineResult<(K, Value)> { Ok((k, kind.finish(&stats)?)) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{finish_groups, group_statistics, merge_groups, AggregateKind};
    use crate::types::{Record, Value};

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new(1, "a", "north", 1.0),
            Record::new(2, "b", "south", 5.0),
            Record::new(3, "c", "north", 9.0),
            Record::new(4, "d", "north", 8.0),
            Record::new(5, "e", "south", 7.0),
        ]
    }

    #[test]
    fn group_counts_and_means() {
        let records = sample_records();
        let groups = group_statistics(&records, |r| r.category.clone(), |r| r.value);

        let counts = finish_groups(groups.clone(), AggregateKind::Count).unwrap();
        assert_eq!(counts["north"], Value::Int64(3));
        assert_eq!(counts["south"], Value::Int64(2));

        let means = finish_groups(groups, AggregateKind::Mean).unwrap();
        assert_eq!(means["north"], Value::Float64(6.0));
        assert_eq!(means["south"], Value::Float64(6.0));
    }

    #[test]
    fn merged_group_means_are_weighted() {
        let records = sample_records();
        // Chunk 1: north [1.0]            -> local mean 1.0
        // Chunk 2: north [9.0, 8.0]       -> local mean 8.5
        // Naive average of means would be 4.75; the weighted mean is 6.0.
        let partials = vec![
            group_statistics(&records[..2], |r| r.category.clone(), |r| r.value),
            group_statistics(&records[2..], |r| r.category.clone(), |r| r.value),
        ];
        let merged = finish_groups(merge_groups(partials), AggregateKind::Mean).unwrap();
        assert_eq!(merged["north"], Value::Float64(6.0));
    }

    #[test]
    fn min_max_per_group() {
        let records = sample_records();
        let groups = group_statistics(&records, |r| r.category.clone(), |r| r.value);
        let mins = finish_groups(groups.clone(), AggregateKind::Min).unwrap();
        let maxs = finish_groups(groups, AggregateKind::Max).unwrap();
        assert_eq!(mins["north"], Value::Float64(1.0));
        assert_eq!(maxs["south"], Value::Float64(7.0));
    }

    #[test]
    fn empty_input_has_no_groups() {
        let groups = group_statistics::<Record, String, _, _>(&[], |r| r.category.clone(), |r| r.value);
        assert!(finish_groups(groups, AggregateKind::Min).unwrap().is_empty());
    }
}
