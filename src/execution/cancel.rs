use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Best-effort cancellation flag shared by the tasks of one dispatch.
///
/// Tasks poll [`CancellationToken::is_cancelled`] between elements; nothing is interrupted
/// mid-step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
