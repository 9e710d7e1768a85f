//! Capabilities handed to the hosted service and to the platform.
//!
//! [`HostControl`] is what the service sees; [`ShutdownHandle`] is what
//! the platform's stop/recycle callbacks use. Both are cheap clones of the
//! bridge's shared state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::environment::PlatformRuntime;
use crate::error::{HostError, Result};
use crate::settings::HostSettings;
use crate::signal::LifecycleSignals;
use crate::types::{HostId, HostMode, HostState};

/// State shared between the bridge, its capabilities and the fault guard.
///
/// Lock-free apart from `entry`, which only orders `run()` entry against a
/// platform stop and is never taken by the fault guard.
pub(crate) struct Shared {
    pub(crate) id: HostId,
    pub(crate) settings: HostSettings,
    pub(crate) mode: HostMode,
    pub(crate) runtime: Arc<dyn PlatformRuntime>,
    pub(crate) signals: LifecycleSignals,
    state: AtomicU8,
    recycle_requested: AtomicBool,
    entry: Mutex<()>,
}

impl Shared {
    pub(crate) fn new(
        settings: HostSettings,
        mode: HostMode,
        runtime: Arc<dyn PlatformRuntime>,
    ) -> Self {
        Self {
            id: HostId::new(),
            settings,
            mode,
            runtime,
            signals: LifecycleSignals::new(),
            state: AtomicU8::new(HostState::Created as u8),
            recycle_requested: AtomicBool::new(false),
            entry: Mutex::new(()),
        }
    }

    /// Takes the first step of `run()`: `Created → Validating`.
    pub(crate) fn enter(&self) -> Result<HostState> {
        let _entry = self.entry.lock();
        self.advance(HostState::Validating)
    }

    /// Requests an exit and reports whether `run()` has been entered.
    ///
    /// A `run()` entering afterwards observes the exit and never starts.
    pub(crate) fn request_exit_after_entry(&self, reason: &str) -> bool {
        let _entry = self.entry.lock();
        self.request_exit(reason);
        self.state() != HostState::Created
    }

    pub(crate) fn state(&self) -> HostState {
        // Only valid discriminants are ever stored.
        HostState::from_u8(self.state.load(Ordering::SeqCst)).unwrap_or(HostState::Stopped)
    }

    /// Moves `from → to` if the bridge is still in `from`.
    pub(crate) fn transition(&self, from: HostState, to: HostState) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        let moved = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if moved {
            tracing::debug!(id = %self.id, old = %from, new = %to, "host state changed");
        }
        moved
    }

    /// Moves from whatever the current state is to `to`.
    pub(crate) fn advance(&self, to: HostState) -> Result<HostState> {
        loop {
            let current = self.state();
            if !current.can_transition_to(to) {
                return Err(HostError::state(format!(
                    "cannot move from {current} to {to}"
                )));
            }
            if self.transition(current, to) {
                return Ok(current);
            }
        }
    }

    pub(crate) fn recycle_requested(&self) -> bool {
        self.recycle_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn request_exit(&self, reason: &str) {
        if self.signals.exit.set() {
            tracing::debug!(id = %self.id, reason = reason, "stop requested");
        }
    }

    /// The platform's coarse restart: stop everything and let the
    /// supervisor bring the process back.
    pub(crate) fn request_recycle(&self, reason: &str) {
        if !self.recycle_requested.swap(true, Ordering::SeqCst) {
            tracing::info!(id = %self.id, reason = reason, "recycle requested");
            if let Err(e) = self.runtime.request_recycle() {
                tracing::warn!(id = %self.id, error = %e, "platform rejected recycle request");
            }
        }
        self.request_exit(reason);
    }
}

/// Capability passed to the hosted service.
///
/// Requests are cooperative: nothing here preempts the service.
#[derive(Clone)]
pub struct HostControl {
    shared: Arc<Shared>,
}

impl HostControl {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Returns the host settings.
    #[must_use]
    pub fn settings(&self) -> &HostSettings {
        &self.shared.settings
    }

    /// Returns the host mode.
    #[must_use]
    pub fn mode(&self) -> HostMode {
        self.shared.mode
    }

    /// Asks the platform for more time to finish stopping.
    ///
    /// Advisory only: forwarded where the platform has a grace-period
    /// mechanism, logged otherwise. Never blocks.
    pub fn request_additional_time(&self, additional: Duration) {
        tracing::debug!(
            id = %self.shared.id,
            additional = %humantime::format_duration(additional),
            "requesting additional time"
        );
        if let Err(e) = self.shared.runtime.request_additional_time(additional) {
            tracing::warn!(id = %self.shared.id, error = %e, "additional time request failed");
        }
    }

    /// Asks the host to restart the service.
    ///
    /// # Errors
    /// Returns [`HostError::Unsupported`] outside role mode: only a cloud
    /// role has a restart primitive, and it recycles the whole process.
    pub fn restart(&self) -> Result<()> {
        tracing::debug!(id = %self.shared.id, "restart requested by service");
        if self.shared.mode.recycles_on_stop() {
            self.shared.request_recycle("restart requested by service");
            Ok(())
        } else {
            Err(HostError::unsupported(format!(
                "restart is not available when hosted as {}",
                self.shared.mode
            )))
        }
    }

    /// Asks the host to stop the service.
    pub fn stop(&self) {
        tracing::debug!(id = %self.shared.id, "stop requested by hosted service");
        if self.shared.mode.recycles_on_stop() {
            self.shared.request_recycle("stop requested by hosted service");
        } else {
            self.shared.request_exit("stop requested by hosted service");
        }
    }
}

impl std::fmt::Debug for HostControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostControl")
            .field("id", &self.shared.id)
            .field("mode", &self.shared.mode)
            .finish_non_exhaustive()
    }
}

/// The platform's stop and recycle callbacks into the bridge.
#[derive(Clone)]
pub struct ShutdownHandle {
    shared: Arc<Shared>,
}

impl ShutdownHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Requests a stop without waiting for it.
    pub fn request_stop(&self) {
        self.shared.request_exit("platform stop");
    }

    /// Requests a stop and waits until teardown has fully completed.
    ///
    /// Returns immediately if the host had not entered `run()`; a later
    /// `run()` then skips start and only releases the handle.
    pub async fn stop(&self) {
        if !self.shared.request_exit_after_entry("platform stop") {
            return;
        }
        self.shared.signals.exited.wait().await;
    }

    /// Platform-initiated recycle.
    pub fn recycle(&self) {
        self.shared.request_recycle("platform recycle");
    }

    /// Returns true once the stop sequence has completed.
    #[must_use]
    pub fn is_exited(&self) -> bool {
        self.shared.signals.exited.is_set()
    }

    /// Returns the current host state.
    #[must_use]
    pub fn state(&self) -> HostState {
        self.shared.state()
    }
}

impl std::fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("id", &self.shared.id)
            .field("state", &self.shared.state())
            .finish()
    }
}
