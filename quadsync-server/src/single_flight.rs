//! Single-flight gate with a one-deep pending queue.
//!
//! At most one pass runs at a time. Triggers that arrive mid-pass collapse
//! into a single queued re-run, no matter how many there are; a pass always
//! refetches the latest revision, so dropping the excess is safe. The lock
//! is never held across a pass.

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Gate {
    running: bool,
    pending: bool,
}

/// Serializes passes and coalesces overlapping triggers.
#[derive(Debug, Default)]
pub struct SingleFlight {
    state: Mutex<Gate>,
}

impl SingleFlight {
    /// Run `pass` now, or queue at most one re-run if a pass is in flight.
    ///
    /// The caller owning the running slot loops to service the pending
    /// re-run; queued re-runs are discarded once `cancel` fires.
    pub fn run<F>(&self, cancel: &CancellationToken, mut pass: F)
    where
        F: FnMut(),
    {
        {
            let mut gate = self.state.lock().expect("single-flight lock poisoned");
            if gate.running {
                gate.pending = true;
                tracing::info!("sync already in progress, queuing pending re-run");
                return;
            }
            gate.running = true;
        }

        loop {
            pass();

            let mut gate = self.state.lock().expect("single-flight lock poisoned");
            if !gate.pending || cancel.is_cancelled() {
                gate.pending = false;
                gate.running = false;
                return;
            }
            gate.pending = false;
            drop(gate);
            tracing::info!("re-running sync due to pending request");
        }
    }
}
