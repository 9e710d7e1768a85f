//! Collaborator contracts implemented by platform adapters.
//!
//! # Toyota Way: Standardized Work (標準作業)
//! Every platform answers the same two environment questions and exposes
//! the same runtime primitives, so the bridge never branches on the OS.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::HostMode;

/// Live view of the OS service manager.
///
/// The bridge owns no state here; every call queries the platform.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    /// Returns true if a service with this name is installed.
    ///
    /// # Errors
    /// Returns an error if the service manager cannot be queried.
    async fn is_service_installed(&self, name: &str) -> Result<bool>;

    /// Returns true if the named service is not currently running.
    ///
    /// # Errors
    /// Returns an error if the service manager cannot be queried.
    async fn is_service_stopped(&self, name: &str) -> Result<bool>;
}

/// Side-channel primitives of the hosting platform.
///
/// All methods must return promptly; they are called from the fault guard
/// and from [`HostControl`](crate::control::HostControl), neither of which
/// may block. Defaults are no-ops for platforms lacking a primitive.
pub trait PlatformRuntime: Send + Sync {
    /// The mode this runtime serves.
    fn mode(&self) -> HostMode;

    /// Asks the platform to extend the stop grace period.
    ///
    /// # Errors
    /// Returns an error if the platform rejected the request.
    fn request_additional_time(&self, _additional: Duration) -> Result<()> {
        Ok(())
    }

    /// Tells the platform the process wants to be recycled.
    ///
    /// # Errors
    /// Returns an error if the request could not be delivered.
    fn request_recycle(&self) -> Result<()> {
        Ok(())
    }

    /// Tells the platform the service finished starting.
    ///
    /// # Errors
    /// Returns an error if the notification could not be delivered.
    fn notify_running(&self) -> Result<()> {
        Ok(())
    }

    /// Tells the platform the service began stopping.
    ///
    /// # Errors
    /// Returns an error if the notification could not be delivered.
    fn notify_stopping(&self) -> Result<()> {
        Ok(())
    }
}
