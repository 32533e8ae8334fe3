//! Cooperative shutdown signal shared by every long-running task.
//!
//! The signal is a broadcast, set-once flag.  Loops observe it in two ways:
//!
//! - **Polling** – `is_triggered()` after every timeout-bounded wait (queue
//!   pops use a 1 s poll interval).
//! - **Waiting** – `triggered().await` inside a `tokio::select!` so that a
//!   backoff sleep or a frame read is abandoned as soon as shutdown starts.
//!
//! Triggering more than once has no further effect.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable handle to the process-wide shutdown flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    /// Creates a signal in the "running" state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Sets the flag and wakes every waiter.
    ///
    /// Returns `true` only for the call that actually flipped the flag, so
    /// callers can log the transition exactly once.
    pub fn trigger(&self) -> bool {
        self.tx.send_if_modified(|stopped| {
            if *stopped {
                false
            } else {
                *stopped = true;
                true
            }
        })
    }

    /// Returns `true` once [`trigger`](Self::trigger) has been called.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the flag is set; resolves immediately if it already is.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
