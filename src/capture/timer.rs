/**
 * ============================================================================
 * ONE-SHOT TIMER MODULE
 * ============================================================================
 *
 * PURPOSE: Cancellable single-shot countdowns for the capture flow
 *
 * USED FOR:
 * - Inactivity timeouts (idle-phase and recording-phase durations)
 * - The delayed success-affirmation continuation in multi-step layers
 *
 * GUARANTEES:
 * - A cancelled timer never fires
 * - Re-arming fully replaces the previous countdown; only one is ever live
 * - A superseded countdown that races its own cancellation is invalidated
 *   by a generation check before the callback runs
 *
 * ============================================================================
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

// Single-shot countdown
//
// Arming bumps a generation counter and aborts the previous task, so a
// stale countdown can neither keep running nor fire late. Callbacks run on
// the tokio runtime the timer was armed on.
pub struct OneShot {
    generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl OneShot {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    // Arm the countdown; any previous countdown is replaced
    pub fn arm<F>(&mut self, duration: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(handle) = self.handle.take() {
            handle.abort();
        }

        let current = Arc::clone(&self.generation);
        // Anchor the deadline at arm time so the countdown length does not
        // depend on when the spawned task is first polled.
        let sleep = tokio::time::sleep(duration);
        self.handle = Some(tokio::spawn(async move {
            sleep.await;

            // A newer arm or a cancel invalidates this countdown
            if current.load(Ordering::SeqCst) == generation {
                on_fire();
            }
        }));
    }

    // Cancel without re-arming; firing after cancel is impossible
    pub fn cancel(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    // Whether a countdown is currently live
    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Default for OneShot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OneShot {
    // Component teardown cancels any pending countdown
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    // Let spawned timer tasks observe an advanced virtual clock
    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_exactly_at_boundary() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);

        let mut timer = OneShot::new();
        timer.arm(Duration::from_secs(12), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_millis(11_999)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);

        let mut timer = OneShot::new();
        timer.arm(Duration::from_secs(5), move || {
            fired_clone.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_countdown() {
        let first = Arc::new(AtomicU32::new(0));
        let second = Arc::new(AtomicU32::new(0));

        let mut timer = OneShot::new();
        let first_clone = Arc::clone(&first);
        timer.arm(Duration::from_secs(5), move || {
            first_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Replace before the first countdown elapses
        tokio::time::advance(Duration::from_secs(3)).await;
        let second_clone = Arc::clone(&second);
        timer.arm(Duration::from_secs(10), move || {
            second_clone.fetch_add(1, Ordering::SeqCst);
        });

        // Past the first deadline: the replaced countdown must not fire
        tokio::time::advance(Duration::from_secs(4)).await;
        settle().await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(6)).await;
        settle().await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_countdown() {
        let fired = Arc::new(AtomicU32::new(0));
        let fired_clone = Arc::clone(&fired);

        {
            let mut timer = OneShot::new();
            timer.arm(Duration::from_secs(2), move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
