//! Latest-wins debouncing for webhook triggers.
//!
//! Every accepted event restarts the timer; the callback fires only after
//! the configured delay passes with no further triggers. One mutex guards
//! the pending timer handle; the callback runs on its own task, never under
//! the lock.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Timer-based trigger coalescing. Must be used inside a tokio runtime.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `callback` to run after the delay, replacing any previously
    /// scheduled callback that has not fired yet.
    pub fn trigger<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });

        let mut pending = self.pending.lock().expect("debounce lock poisoned");
        if let Some(stale) = pending.replace(task) {
            stale.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn settle() {
        // Let spawned timer tasks run to completion on the paused clock.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_triggers_collapse_to_one_callback() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let fired = fired.clone();
            debouncer.trigger(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            settle().await;
            tokio::time::advance(Duration::from_millis(200)).await;
        }

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1, "burst must fire exactly once");
    }

    #[tokio::test(start_paused = true)]
    async fn a_new_trigger_resets_the_window() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let fired = Arc::new(AtomicUsize::new(0));

        let f = fired.clone();
        debouncer.trigger(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        // 1.5s in: nothing yet; retrigger pushes the deadline out.
        tokio::time::advance(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let f = fired.clone();
        debouncer.trigger(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        // 1.5s after the retrigger: the original deadline has passed but the
        // reset window has not.
        tokio::time::advance(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "window must have been reset");

        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn latest_callback_wins() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = first.clone();
        debouncer.trigger(move || {
            f.fetch_add(1, Ordering::SeqCst);
        });
        let s = second.clone();
        debouncer.trigger(move || {
            s.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        tokio::time::advance(Duration::from_secs(3)).await;
        settle().await;
        assert_eq!(first.load(Ordering::SeqCst), 0, "replaced callback must not fire");
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_periods_allow_multiple_firings() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let f = fired.clone();
            debouncer.trigger(move || {
                f.fetch_add(1, Ordering::SeqCst);
            });
            settle().await;
            tokio::time::advance(Duration::from_secs(5)).await;
            settle().await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
