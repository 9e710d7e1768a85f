//! Service contracts.
//!
//! # Toyota Way: Standardized Work (標準作業)
//! Every hosted service follows the same start/stop contract, whichever
//! platform ends up driving it.

use async_trait::async_trait;

use crate::control::HostControl;
use crate::error::Result;

/// The ready-to-run wrapper the bridge drives.
///
/// A `false` result and an `Err` are both fatal; the bridge never retries.
///
/// # Implementation Guidelines
///
/// 1. **start**: Kick off the service's work and return promptly. Work that
///    runs until stopped belongs in a spawned task or thread.
///
/// 2. **stop**: Stop that work and wait for it. The bridge imposes no
///    timeout; use [`HostControl::request_additional_time`] when the
///    platform enforces one.
///
/// 3. **release**: Free whatever the handle still holds. Called exactly
///    once, whether or not the service was started.
#[async_trait]
pub trait ServiceHandle: Send {
    /// Starts the service.
    ///
    /// # Errors
    /// Returns an error if the service raised while starting.
    async fn start(&mut self, control: &HostControl) -> Result<bool>;

    /// Stops the service.
    ///
    /// # Errors
    /// Returns an error if the service raised while stopping.
    async fn stop(&mut self, control: &HostControl) -> Result<bool>;

    /// Releases resources held by the handle.
    async fn release(&mut self) {}
}

/// User-facing service logic.
///
/// # Example
///
/// ```rust,ignore
/// use anfitrion_core::{HostControl, ServiceControl};
/// use async_trait::async_trait;
///
/// struct Sample;
///
/// #[async_trait]
/// impl ServiceControl for Sample {
///     async fn start(&mut self, _control: &HostControl) -> bool { true }
///     async fn stop(&mut self, _control: &HostControl) -> bool { true }
/// }
/// ```
#[async_trait]
pub trait ServiceControl: Send + 'static {
    /// Starts the service. Return `false` to refuse.
    async fn start(&mut self, control: &HostControl) -> bool;

    /// Stops the service. Return `false` if it could not stop cleanly.
    async fn stop(&mut self, control: &HostControl) -> bool;
}
