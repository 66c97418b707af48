// PageMark debounced auto-save
// Runs a save once scrolling has been quiet for a fixed period. Every new
// scroll event aborts the pending task and schedules a fresh one. The save
// itself runs on the blocking pool since it writes to SQLite.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet period after the last scroll event before the position is saved.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

/// Cancel-and-reschedule timer for one page agent.
///
/// At most one scheduled save exists at a time. Must be used from within a
/// tokio runtime.
pub struct AutoSaveScheduler {
    quiet_period: Duration,
    pending: Option<JoinHandle<()>>,
}

impl AutoSaveScheduler {
    pub fn new(quiet_period: Duration) -> Self {
        Self { quiet_period, pending: None }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Cancels any pending save and schedules `save` after the quiet period.
    ///
    /// Once `save` has started on the blocking pool it runs to completion;
    /// cancelling only stops saves still waiting out the quiet period.
    pub fn reschedule<F>(&mut self, save: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let quiet = self.quiet_period;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if let Err(e) = tokio::task::spawn_blocking(save).await {
                tracing::error!(error = %e, "auto-save task failed");
            }
        }));
    }

    /// Aborts the pending save, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// True while a scheduled save has not yet run.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Default for AutoSaveScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Drop for AutoSaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
