//! Shared worker-task state.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// State shared between a worker task and the controller monitoring it:
/// a cooperative cancellation flag, a monotonically increasing item counter,
/// and a first-error-wins error slot.
///
/// The counter is read without synchronization stronger than atomic loads;
/// it exists for monitoring, not correctness.
#[derive(Debug)]
pub struct WorkerContext {
    running: AtomicBool,
    count: AtomicU64,
    error: Mutex<Option<anyhow::Error>>,
}

impl WorkerContext {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            count: AtomicU64::new(0),
            error: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Request cooperative cancellation; the worker observes this at its
    /// next loop iteration.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub(crate) fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error. The first error wins; later ones are logged and
    /// dropped.
    pub(crate) fn record_error(&self, error: anyhow::Error) {
        let mut slot = self.error.lock().expect("error slot lock poisoned");
        if slot.is_none() {
            *slot = Some(error);
        } else {
            tracing::debug!("dropping subsequent worker error: {error:#}");
        }
    }

    /// Take the recorded error, if any.
    pub fn take_error(&self) -> Option<anyhow::Error> {
        self.error.lock().expect("error slot lock poisoned").take()
    }

    pub fn has_error(&self) -> bool {
        self.error
            .lock()
            .expect("error slot lock poisoned")
            .is_some()
    }
}

impl Default for WorkerContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_error_wins() {
        let ctx = WorkerContext::new();
        ctx.record_error(anyhow::anyhow!("first"));
        ctx.record_error(anyhow::anyhow!("second"));

        let error = ctx.take_error().unwrap();
        assert_eq!(error.to_string(), "first");
        assert!(ctx.take_error().is_none());
    }

    #[test]
    fn test_stop_flips_running() {
        let ctx = WorkerContext::new();
        assert!(ctx.is_running());
        ctx.stop();
        assert!(!ctx.is_running());
    }
}
