use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Caller-owned cancellation context.
///
/// The ingest core itself never checks this mid-operation; its operations
/// are short and synchronous. Entry points (the wire layer) use `is_done`
/// to skip work whose caller has already gone away.
#[derive(Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_done(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }
        matches!(self.deadline, Some(d) if Instant::now() >= d)
    }
}
