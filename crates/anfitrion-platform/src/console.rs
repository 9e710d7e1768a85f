//! Console adapters.
//!
//! A console process has no service manager behind it and no platform
//! primitives: recycles end the process and grace periods are unbounded.

use anfitrion_core::{HostEnvironment, HostMode, PlatformRuntime};
use async_trait::async_trait;

/// Environment for machines without a known service manager.
///
/// No service is ever installed, so nothing can already be running.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedEnvironment;

#[async_trait]
impl HostEnvironment for DetachedEnvironment {
    async fn is_service_installed(&self, _name: &str) -> anfitrion_core::Result<bool> {
        Ok(false)
    }

    async fn is_service_stopped(&self, _name: &str) -> anfitrion_core::Result<bool> {
        Ok(true)
    }
}

/// Runtime for an interactive console process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleRuntime;

impl ConsoleRuntime {
    /// Creates the console runtime.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PlatformRuntime for ConsoleRuntime {
    fn mode(&self) -> HostMode {
        HostMode::Console
    }

    fn request_recycle(&self) -> anfitrion_core::Result<()> {
        tracing::info!("recycle requested, the console process will exit");
        Ok(())
    }
}
