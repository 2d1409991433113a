use std::any::Any;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Convenience result type for record-source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Error type returned by the chunker, the worker pool and the execution engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Non-positive parallelism or malformed configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// An aggregate (min/max) was requested over an empty input.
    #[error("empty aggregate: {aggregate} is undefined for an empty input")]
    EmptyAggregate { aggregate: &'static str },

    /// A chunk task failed. `task` is the position of the failing task in dispatch order, which
    /// for engine runs is the chunk index.
    #[error("task {task} failed: {source}")]
    TaskFailure {
        task: usize,
        #[source]
        source: TaskError,
    },

    /// The pool was shut down while tasks were still outstanding. The pool is unusable afterward.
    #[error("worker pool shut down with {outstanding} outstanding task(s)")]
    PoolShutdownWhileBusy { outstanding: usize },

    /// Work was submitted to a pool that has already been shut down.
    #[error("worker pool is shut down")]
    PoolClosed,

    /// The underlying thread pool could not be built.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

impl PipelineError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// Failure raised inside a single task: a panic, or an error returned by a fallible transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("task panicked: {s}")
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("task panicked: {s}")
        } else {
            "task panicked".to_string()
        };
        Self { message }
    }

    pub(crate) fn into_failure(self, task: usize) -> PipelineError {
        PipelineError::TaskFailure { task, source: self }
    }
}

/// Error type returned by the record source (generator and file readers).
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding error, including malformed numeric columns.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON decoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record decoded but violates the record invariants.
    #[error("invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Generator parameters that cannot produce records.
    #[error("invalid generator settings: {message}")]
    InvalidGenerator { message: String },

    /// The file extension does not map to a known record format.
    #[error("unsupported record format for path '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },
}
