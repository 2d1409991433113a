use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{ExecutionMode, OperationKind};

/// Execution events emitted by the engine.
///
/// Chunk events are emitted from worker threads; run events from the calling thread.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        operation: OperationKind,
        mode: ExecutionMode,
        records: usize,
    },
    ChunkStarted {
        chunk: usize,
        start_row: usize,
        row_count: usize,
    },
    ChunkFinished {
        chunk: usize,
        rows_processed: usize,
    },
    ChunkCancelled {
        chunk: usize,
        rows_processed: usize,
    },
    ChunkFailed {
        chunk: usize,
        error: String,
    },
    ShortCircuited {
        chunk: usize,
    },
    RunFinished {
        operation: OperationKind,
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
    RunFailed {
        operation: OperationKind,
        error: String,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Forwards execution events to `tracing`.
///
/// Run-level events are logged at `info` (failures at `warn`), chunk-level events at `debug`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted {
                operation,
                mode,
                records,
            } => tracing::info!(%operation, ?mode, records, "pipeline run started"),
            ExecutionEvent::ChunkStarted {
                chunk,
                start_row,
                row_count,
            } => tracing::debug!(chunk, start_row, row_count, "chunk started"),
            ExecutionEvent::ChunkFinished {
                chunk,
                rows_processed,
            } => tracing::debug!(chunk, rows_processed, "chunk finished"),
            ExecutionEvent::ChunkCancelled {
                chunk,
                rows_processed,
            } => tracing::debug!(chunk, rows_processed, "chunk cancelled"),
            ExecutionEvent::ChunkFailed { chunk, error } => {
                tracing::warn!(chunk, %error, "chunk failed")
            }
            ExecutionEvent::ShortCircuited { chunk } => {
                tracing::debug!(chunk, "outcome decided, not waiting for remaining chunks")
            }
            ExecutionEvent::RunFinished {
                operation,
                elapsed,
                metrics,
            } => tracing::info!(%operation, ?elapsed, %metrics, "pipeline run finished"),
            ExecutionEvent::RunFailed { operation, error } => {
                tracing::warn!(%operation, %error, "pipeline run failed")
            }
        }
    }
}

/// Real-time metrics for an execution run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
/// After a short-circuited run, straggling chunk tasks may still update the counters until the
/// pool is idle.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    rows_processed: AtomicU64,
    chunks_started: AtomicU64,
    chunks_finished: AtomicU64,
    chunks_cancelled: AtomicU64,
    chunks_failed: AtomicU64,

    active_chunks: AtomicUsize,
    max_active_chunks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            rows_processed: AtomicU64::new(0),
            chunks_started: AtomicU64::new(0),
            chunks_finished: AtomicU64::new(0),
            chunks_cancelled: AtomicU64::new(0),
            chunks_failed: AtomicU64::new(0),
            active_chunks: AtomicUsize::new(0),
            max_active_chunks: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.rows_processed.store(0, Ordering::SeqCst);
        self.chunks_started.store(0, Ordering::SeqCst);
        self.chunks_finished.store(0, Ordering::SeqCst);
        self.chunks_cancelled.store(0, Ordering::SeqCst);
        self.chunks_failed.store(0, Ordering::SeqCst);
        self.active_chunks.store(0, Ordering::SeqCst);
        self.max_active_chunks.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_chunk_start(&self) {
        self.chunks_started.fetch_add(1, Ordering::SeqCst);
        let now = self.active_chunks.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_chunks.fetch_max(now, Ordering::SeqCst);
    }

    /// A started chunk ended; `completed` is false when it stopped on cancellation.
    pub fn on_chunk_end(&self, rows: usize, completed: bool) {
        self.rows_processed.fetch_add(rows as u64, Ordering::SeqCst);
        if completed {
            self.chunks_finished.fetch_add(1, Ordering::SeqCst);
        } else {
            self.chunks_cancelled.fetch_add(1, Ordering::SeqCst);
        }
        self.leave_chunk();
    }

    /// A started chunk raised an error or panicked.
    pub fn on_chunk_failed(&self) {
        self.chunks_failed.fetch_add(1, Ordering::SeqCst);
        self.leave_chunk();
    }

    fn leave_chunk(&self) {
        // Saturating: a new run may have reset the counter under a straggler.
        let _ = self
            .active_chunks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    /// A chunk was cancelled before it started.
    pub fn on_chunk_skipped(&self) {
        self.chunks_cancelled.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            rows_processed: self.rows_processed.load(Ordering::SeqCst),
            chunks_started: self.chunks_started.load(Ordering::SeqCst),
            chunks_finished: self.chunks_finished.load(Ordering::SeqCst),
            chunks_cancelled: self.chunks_cancelled.load(Ordering::SeqCst),
            chunks_failed: self.chunks_failed.load(Ordering::SeqCst),
            max_active_chunks: self.max_active_chunks.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub rows_processed: u64,
    pub chunks_started: u64,
    pub chunks_finished: u64,
    pub chunks_cancelled: u64,
    pub chunks_failed: u64,
    pub max_active_chunks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, rows_processed={}, chunks={}/{} (cancelled={}, failed={}), max_active_chunks={}, elapsed={:?}",
            self.run_id,
            self.rows_processed,
            self.chunks_finished,
            self.chunks_started,
            self.chunks_cancelled,
            self.chunks_failed,
            self.max_active_chunks,
            self.elapsed
        )
    }
}
