//! `rust-parallel-pipeline` runs record-processing pipelines over an in-memory, read-only
//! sequence of [`types::Record`]s, either sequentially or split into chunks on a fixed-size
//! worker pool.
//!
//! The primary entrypoint is [`execution::ExecutionEngine`]. Every call takes a
//! [`execution::PipelineConfig`] that selects the [`execution::ExecutionMode`] and the target
//! parallelism; parallel results always equal the sequential ones for deterministic operations.
//!
//! ## Operations
//!
//! - filter / map / fallible map: order-preserving
//! - reduce with an identity and an associative combine
//! - group aggregate (count, sum, mean, min, max) with weighted recombination of means
//! - partition into (matching, rest)
//! - top-k with ties broken by original position
//! - statistics (count, sum, min, max, mean)
//! - any / all / none match, which stop early once the answer is known
//!
//! ## Quick example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rust_parallel_pipeline::execution::{ExecutionEngine, Operation, PipelineConfig};
//! use rust_parallel_pipeline::types::Record;
//!
//! # fn main() -> Result<(), rust_parallel_pipeline::PipelineError> {
//! let records: Arc<[Record]> = (1..=7)
//!     .map(|i| Record::new(i, format!("record_{i}"), "c", i as f64))
//!     .collect();
//! let engine = ExecutionEngine::with_parallelism(3)?;
//! let config = PipelineConfig::parallel();
//!
//! let sum = engine.run(&records, Operation::reduce(0.0, |a, b| a + b), &config)?;
//! assert_eq!(sum.as_scalar(), Some(28.0));
//!
//! let top = engine.top_k(&records, 2, |a, b| b.value.total_cmp(&a.value), &config)?;
//! assert_eq!(top.iter().map(|r| r.id).collect::<Vec<_>>(), vec![7, 6]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`execution`]: worker pool, chunking, engine, observer hooks and metrics
//! - [`processing`]: per-chunk computations and the combinators that merge them
//! - [`source`]: seeded generator and CSV / JSON record readers
//! - [`types`]: record and chunk types
//! - [`error`]: error types used across the crate

pub mod error;
pub mod execution;
pub mod processing;
pub mod source;
pub mod types;

pub use error::{PipelineError, PipelineResult, SourceError, SourceResult, TaskError};
