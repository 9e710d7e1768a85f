//! Binary lifecycle signals.
//!
//! A [`Latch`] is set at most once and stays set. Setting it never blocks
//! and takes no lock shared with the lifecycle path, so it is safe to call
//! from the fault guard.

use std::sync::Arc;

use tokio::sync::watch;

/// A set-once, awaitable binary signal.
#[derive(Debug, Clone)]
pub struct Latch {
    tx: Arc<watch::Sender<bool>>,
}

impl Latch {
    /// Creates an unset latch.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Sets the latch. Returns true if this call set it.
    pub fn set(&self) -> bool {
        self.tx.send_if_modified(|set| {
            if *set {
                false
            } else {
                *set = true;
                true
            }
        })
    }

    /// Returns true if the latch has been set.
    #[must_use]
    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until the latch is set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

/// The two signals coordinating the run loop and a stopping caller.
#[derive(Debug, Clone, Default)]
pub struct LifecycleSignals {
    /// Stop requested (by the platform, the service, or the fault guard).
    pub exit: Latch,
    /// Stop sequence fully completed.
    pub exited: Latch,
}

impl LifecycleSignals {
    /// Creates a fresh pair of unset signals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
