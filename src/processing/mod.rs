//! Per-chunk computations and the combinators that merge their partial results.
//!
//! Every operation is split into two halves:
//!
//! - a **chunk function** that runs over a contiguous slice of the input (the same function is
//!   the sequential reference when given the whole input), and
//! - a **merge function** that folds the per-chunk outputs, in chunk order, into the final result.
//!
//! | Operation | Chunk function | Merge |
//! |---|---|---|
//! | filter | [`filter()`] | [`concat_partials`] |
//! | map | [`map()`] / [`try_map`] | [`concat_partials`] |
//! | reduce | [`reduce()`] | [`merge_reduced`] |
//! | group aggregate | [`group_statistics`] | [`merge_groups`] then [`finish_groups`] |
//! | partition | [`partition()`] | [`merge_partitions`] |
//! | top-k | [`top_k_candidates`] | [`merge_top_k`] |
//! | statistics | [`statistics()`] | [`merge_statistics`] |
//! | any/all/none | [`check_chunk`] | [`merge_verdicts`] |
//!
//! ## Example: chunked reduce equals a single pass
//!
//! ```rust
//! use rust_parallel_pipeline::processing::{merge_reduced, reduce};
//! use rust_parallel_pipeline::types::Record;
//!
//! let records: Vec<Record> = (1..=7)
//!     .map(|i| Record::new(i, format!("r{i}"), "c", i as f64))
//!     .collect();
//!
//! let whole = reduce(&records, 0.0, |r| r.value, |a, b| a + b);
//! let partials = vec![
//!     reduce(&records[..3], 0.0, |r| r.value, |a, b| a + b),
//!     reduce(&records[3..5], 0.0, |r| r.value, |a, b| a + b),
//!     reduce(&records[5..], 0.0, |r| r.value, |a, b| a + b),
//! ];
//! assert_eq!(whole, 28.0);
//! assert_eq!(merge_reduced(0.0, partials, |a, b| a + b), whole);
//! ```

pub mod filter;
pub mod group;
pub mod map;
pub mod partition;
pub mod predicate;
pub mod reduce;
pub mod stats;
pub mod top_k;

pub use filter::filter;
pub use group::{finish_groups, group_statistics, merge_groups, AggregateKind};
pub use map::{map, try_map};
pub use partition::{merge_partitions, partition, Partitioned};
pub use predicate::{
    all_match, any_match, check_chunk, merge_verdicts, none_match, ChunkOutcome, ChunkVerdict, MatchKind,
};
pub use reduce::{merge_reduced, reduce};
pub use stats::{merge_statistics, statistics, Statistics};
pub use top_k::{merge_top_k, top_k, top_k_candidates, Candidate};

/// Concatenate per-chunk sequences in chunk order.
pub fn concat_partials<T>(partials: impl IntoIterator<Item = Vec<T>>) -> Vec<T> {
    partials.into_iter().flatten().collect()
}
