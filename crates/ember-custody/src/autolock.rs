//! Cooperative auto-lock
//!
//! A best-effort UX affordance layered on top of the mandatory lazy session
//! check: after the configured idle window the task calls `lock()`.
//! Correctness never depends on this timer firing; an expired session is
//! always caught by `ensure_unlocked` on the next secret-gated call.

use crate::orchestrator::WalletOrchestrator;
use std::sync::Arc;
use std::time::Duration;

/// Handle to a scheduled auto-lock. Cancels the task on drop.
pub struct AutoLockHandle {
    task: tokio::task::JoinHandle<()>,
}

impl AutoLockHandle {
    /// Cancel the pending auto-lock
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// True once the task has fired or was cancelled
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AutoLockHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Schedule a lock after `after` elapses (e.g. app moved to background).
///
/// Rescheduling is the caller's concern: cancel the previous handle and
/// schedule a new one on each foreground/background transition.
pub fn schedule_auto_lock(
    orchestrator: Arc<WalletOrchestrator>,
    after: Duration,
) -> AutoLockHandle {
    let task = tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Err(e) = orchestrator.lock().await {
            // Best-effort: the lazy check still guards every secret access.
            tracing::warn!(error = %e, "auto-lock failed");
        } else {
            tracing::debug!("auto-lock fired");
        }
    });
    AutoLockHandle { task }
}
