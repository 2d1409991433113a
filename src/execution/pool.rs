//! Fixed-size worker pool with explicit submit / await.
//!
//! The pool owns a [`rayon::ThreadPool`] with exactly `parallelism` threads; tasks beyond that
//! bound wait in the pool's FIFO queue until a thread frees. Every task gets a single-slot result
//! channel, so results are written once and read once, and the caller decides the order in
//! which they are collected.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Select};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{PipelineError, PipelineResult, TaskError};
use crate::types::PartialResult;

use super::tracker::TaskTracker;

/// Number of execution units available on this host (at least 1).
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Run `task`, turning a panic into a [`TaskError`].
pub(crate) fn guarded<T, F>(task: F) -> Result<T, TaskError>
where
    F: FnOnce() -> Result<T, TaskError>,
{
    panic::catch_unwind(AssertUnwindSafe(task)).unwrap_or_else(|payload| Err(TaskError::from_panic(payload)))
}

/// Handle to the result of one submitted task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes and return its result.
    pub fn join(self) -> Result<T, TaskError> {
        recv_outcome(&self.rx)
    }
}

fn recv_outcome<T>(rx: &Receiver<Result<T, TaskError>>) -> Result<T, TaskError> {
    rx.recv()
        .unwrap_or_else(|_| Err(TaskError::new("task dropped before producing a result")))
}

/// Outcome of [`WorkerPool::await_until`].
#[derive(Debug)]
pub enum Settled<T> {
    /// A decisive result arrived; remaining tasks were not awaited.
    Decided(PartialResult<T>),
    /// Every task finished without a decisive result; values are in submission order.
    Completed(Vec<T>),
}

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    pool: ThreadPool,
    parallelism: usize,
    tracker: Arc<TaskTracker>,
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("parallelism", &self.parallelism)
            .field("outstanding", &self.tracker.outstanding())
            .field("closed", &self.tracker.is_closed())
            .finish()
    }
}

impl WorkerPool {
    /// Create a pool running at most `parallelism` tasks at once.
    ///
    /// Fails with [`PipelineError::InvalidConfiguration`] if `parallelism == 0`.
    pub fn new(parallelism: usize) -> PipelineResult<Self> {
        if parallelism == 0 {
            return Err(PipelineError::invalid_config("pool parallelism must be >= 1"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(parallelism)
            .thread_name(|i| format!("pipeline-worker-{i}"))
            .build()?;
        tracing::debug!(parallelism, "worker pool created");
        Ok(Self {
            pool,
            parallelism,
            tracker: TaskTracker::new(),
        })
    }

    /// Create a pool sized by [`default_parallelism`].
    pub fn with_default_parallelism() -> PipelineResult<Self> {
        Self::new(default_parallelism())
    }

    /// Maximum number of concurrently executing tasks.
    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Number of submitted tasks that have not finished yet.
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Whether [`WorkerPool::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Queue `task` for execution.
    ///
    /// A panic inside the task is caught and reported through the handle as a [`TaskError`].
    pub fn submit<T, F>(&self, task: F) -> PipelineResult<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let guard = self.tracker.begin()?;
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.pool.spawn(move || {
            let outcome = guarded(task);
            // Release the slot before publishing, so a caller that has seen every result also
            // sees an idle pool.
            drop(guard);
            // The receiver may be gone (early return or dropped handle); the result is discarded.
            let _ = tx.send(outcome);
        });
        Ok(TaskHandle { rx })
    }

    /// Block until every task finishes or one fails.
    ///
    /// Results are returned in submission order. Handles are awaited in that order, so the
    /// error returned is the first failure by submission (chunk) order; results of tasks still
    /// running are discarded.
    pub fn await_all<T>(&self, handles: Vec<TaskHandle<T>>) -> PipelineResult<Vec<T>> {
        let mut out = Vec::with_capacity(handles.len());
        for (task, handle) in handles.into_iter().enumerate() {
            out.push(handle.join().map_err(|e| e.into_failure(task))?);
        }
        Ok(out)
    }

    /// Receive results in completion order and return as soon as `decisive` accepts one.
    ///
    /// Tasks that have not finished at that point are not awaited. Failures are held back and
    /// the lowest-indexed one is returned once every task has settled; a decisive result that
    /// arrives after a lower-indexed failure yields that failure instead.
    pub fn await_until<T, D>(&self, handles: Vec<TaskHandle<T>>, mut decisive: D) -> PipelineResult<Settled<T>>
    where
        D: FnMut(&T) -> bool,
    {
        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(handles.len()).collect();
        let mut first_error: Option<(usize, TaskError)> = None;

        let mut select = Select::new();
        for handle in &handles {
            select.recv(&handle.rx);
        }

        for _ in 0..handles.len() {
            let op = select.select();
            let task = op.index();
            let outcome = op
                .recv(&handles[task].rx)
                .unwrap_or_else(|_| Err(TaskError::new("task dropped before producing a result")));
            select.remove(task);

            match outcome {
                Ok(value) if decisive(&value) => {
                    if let Some((failed, err)) = first_error.take().filter(|(failed, _)| *failed < task) {
                        return Err(err.into_failure(failed));
                    }
                    return Ok(Settled::Decided(PartialResult::new(task, value)));
                }
                Ok(value) => slots[task] = Some(value),
                Err(err) => {
                    if first_error.as_ref().is_none_or(|(failed, _)| task < *failed) {
                        first_error = Some((task, err));
                    }
                }
            }
        }

        if let Some((failed, err)) = first_error {
            return Err(err.into_failure(failed));
        }
        Ok(Settled::Completed(slots.into_iter().flatten().collect()))
    }

    /// Block until no submitted task is outstanding.
    pub fn wait_idle(&self) {
        self.tracker.wait_idle();
    }

    /// Release the pool.
    ///
    /// Fails with [`PipelineError::PoolShutdownWhileBusy`] if tasks are still outstanding. In
    /// both cases the pool rejects further submissions with [`PipelineError::PoolClosed`].
    pub fn shutdown(&self) -> PipelineResult<()> {
        let result = self.tracker.close();
        match &result {
            Ok(()) => tracing::debug!(parallelism = self.parallelism, "worker pool shut down"),
            Err(err) => tracing::warn!(error = %err, "worker pool shut down while busy"),
        }
        result
    }
}
