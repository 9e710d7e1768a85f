//! anfitrion: run one service as a console process, an OS service, or a
//! cloud worker role.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use anfitrion::prelude::*;
//!
//! struct Sample;
//!
//! #[async_trait]
//! impl ServiceControl for Sample {
//!     async fn start(&mut self, _control: &HostControl) -> bool { true }
//!     async fn stop(&mut self, _control: &HostControl) -> bool { true }
//! }
//!
//! #[tokio::main]
//! async fn main() -> std::process::ExitCode {
//!     anfitrion::run(|host| {
//!         host.service(|_settings| Ok(Sample));
//!         Ok(())
//!     })
//!     .await
//!     .into()
//! }
//! ```

#![deny(unsafe_code)]

mod entry;
pub mod logging;

pub use anfitrion_core as core;
pub use anfitrion_platform as platform;
pub use entry::{CONFIG_ENV, load_config, run, run_with};

/// Prelude module for common imports.
pub mod prelude {
    pub use anfitrion_core::{
        ExitCode, Fault, FaultReporter, HostConfig, HostConfigurator, HostControl, HostError,
        HostMode, HostSettings, HostState, ServiceControl, ServiceDescriptor, ServiceHandle,
        ShutdownHandle, exempt_current_thread,
    };
    pub use anfitrion_platform::{ServiceManager, detect_mode, detect_service_manager};
    pub use async_trait::async_trait;
}
