//! # Save Scheduling
//!
//! Two small pieces the store composes:
//!
//! - [`DirtyTracker`]: revision bookkeeping. Every accepted edit bumps the
//!   revision; a successful save records the revision it snapshotted. The
//!   document is dirty while the two differ, so edits made during an
//!   in-flight save stay dirty after it lands.
//! - [`SaveTimer`]: a cancellable one-shot debounce timer. Re-arming
//!   aborts the pending sleep, so a burst of edits produces one save.
//!
//! Once the timer's delay elapses the task it runs is detached: cancelling
//! or dropping the timer after that point never aborts a save in flight.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Debounce window between the last edit and the draft save
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(3000);

#[derive(Debug, Default)]
pub struct DirtyTracker {
    /// Bumped on every accepted edit
    revision: u64,

    /// Revision most recently persisted (or loaded)
    saved_revision: u64,

    saving: bool,

    last_saved: Option<DateTime<Utc>>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted edit, returning the new revision
    pub fn mark_changed(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    /// Treat the current revision as persisted (fresh load)
    pub fn mark_clean(&mut self) {
        self.saved_revision = self.revision;
    }

    /// Start a save of the current revision, returning it
    pub fn begin_save(&mut self) -> u64 {
        self.saving = true;
        self.revision
    }

    pub fn save_succeeded(&mut self, revision: u64, at: DateTime<Utc>) {
        self.saving = false;
        self.saved_revision = self.saved_revision.max(revision);
        self.last_saved = Some(at);
    }

    pub fn save_failed(&mut self) {
        self.saving = false;
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }
}

/// Cancellable debounce timer
#[derive(Debug, Default)]
pub struct SaveTimer {
    handle: Option<JoinHandle<()>>,
}

impl SaveTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay`, replacing any pending timer
    ///
    /// Needs a tokio runtime; without one the timer stays disarmed and the
    /// edit waits for the next explicit save.
    pub fn arm<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                tracing::warn!("No tokio runtime available, debounced save not scheduled");
                return;
            }
        };

        let detached = runtime.clone();
        self.handle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            detached.spawn(task);
        }));
    }

    /// Cancel the pending timer, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Whether a timer is waiting to fire
    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for SaveTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_dirty_lifecycle() {
        let mut tracker = DirtyTracker::new();
        assert!(!tracker.is_dirty());

        tracker.mark_changed();
        assert!(tracker.is_dirty());

        let revision = tracker.begin_save();
        assert!(tracker.is_saving());
        tracker.save_succeeded(revision, Utc::now());

        assert!(!tracker.is_dirty());
        assert!(!tracker.is_saving());
        assert!(tracker.last_saved().is_some());
    }

    #[test]
    fn test_edit_during_save_stays_dirty() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_changed();

        let revision = tracker.begin_save();
        tracker.mark_changed();
        tracker.save_succeeded(revision, Utc::now());

        assert!(tracker.is_dirty());
    }

    #[test]
    fn test_failed_save_stays_dirty() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_changed();
        tracker.begin_save();
        tracker.save_failed();

        assert!(tracker.is_dirty());
        assert!(!tracker.is_saving());
        assert!(tracker.last_saved().is_none());
    }

    #[test]
    fn test_mark_clean_after_load() {
        let mut tracker = DirtyTracker::new();
        tracker.mark_changed();
        tracker.mark_changed();
        tracker.mark_clean();
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.revision(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = SaveTimer::new();

        let counter = fired.clone();
        timer.arm(Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_armed());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_pending_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = SaveTimer::new();

        for _ in 0..5 {
            let counter = fired.clone();
            timer.arm(Duration::from_millis(100), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = SaveTimer::new();

        let counter = fired.clone();
        timer.arm(Duration::from_millis(100), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();
        assert!(!timer.is_armed());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_does_not_abort_task() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut timer = SaveTimer::new();

        let counter = finished.clone();
        timer.arm(Duration::from_millis(100), async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(150)).await;
        timer.cancel();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_arm_without_runtime_is_a_noop() {
        let mut timer = SaveTimer::new();
        timer.arm(Duration::from_millis(10), async {});
        assert!(!timer.is_armed());
    }
}
