use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Default)]
struct TrackerState {
    outstanding: usize,
    closed: bool,
}

/// Blocking bookkeeping for a worker pool: outstanding-task count plus the closed flag.
///
/// All mutations go through one mutex, so independent pipeline calls sharing a pool see a
/// consistent view.
#[derive(Debug, Default)]
pub(crate) struct TaskTracker {
    state: Mutex<TrackerState>,
    idle: Condvar,
}

impl TaskTracker {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        // Tasks never run user code while holding this lock, so a poisoned state is still valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register one new task. Fails if the pool has been shut down.
    pub(crate) fn begin(self: &Arc<Self>) -> PipelineResult<TaskGuard> {
        let mut g = self.lock();
        if g.closed {
            return Err(PipelineError::PoolClosed);
        }
        g.outstanding += 1;
        Ok(TaskGuard {
            tracker: Arc::clone(self),
        })
    }

    fn finish(&self) {
        let mut g = self.lock();
        g.outstanding -= 1;
        if g.outstanding == 0 {
            self.idle.notify_all();
        }
    }

    pub(crate) fn outstanding(&self) -> usize {
        self.lock().outstanding
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Block until no task is outstanding.
    pub(crate) fn wait_idle(&self) {
        let mut g = self.lock();
        while g.outstanding > 0 {
            g = self.idle.wait(g).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mark the pool closed. Errors if tasks are still outstanding; the pool is closed either way.
    pub(crate) fn close(&self) -> PipelineResult<()> {
        let mut g = self.lock();
        g.closed = true;
        if g.outstanding > 0 {
            return Err(PipelineError::PoolShutdownWhileBusy {
                outstanding: g.outstanding,
            });
        }
        Ok(())
    }
}

/// Decrements the outstanding count when dropped.
pub(crate) struct TaskGuard {
    tracker: Arc<TaskTracker>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tracker.finish();
    }
}
