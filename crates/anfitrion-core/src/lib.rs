// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # anfitrion-core
//!
//! Host lifecycle bridge for the anfitrion service host.
//!
//! One service implementation runs unchanged as a console process, a native
//! OS service or a cloud worker role. This crate provides:
//!
//! - [`ServiceControl`] / [`ServiceHandle`] - the start/stop contract
//! - [`RoleHost`] - the lifecycle bridge driving the contract
//! - [`HostControl`] / [`ShutdownHandle`] - capabilities for the service and the platform
//! - [`FaultGuard`] - containment of unhandled faults
//! - [`HostBuilder`] / [`HostConfigurator`] - wiring and configuration
//! - [`HostEnvironment`] / [`PlatformRuntime`] - contracts for platform adapters
//!
//! ## Iron Lotus Framework
//!
//! - **Jidoka**: Unhandled faults stop the line and are never swallowed
//! - **Poka-Yoke**: Invalid settings and missing collaborators fail at build time
//! - **Standardized Work**: Every platform drives the same lifecycle
//!
//! ## Example
//!
//! ```rust,ignore
//! use anfitrion_core::{HostControl, ServiceControl};
//! use async_trait::async_trait;
//!
//! struct Sample;
//!
//! #[async_trait]
//! impl ServiceControl for Sample {
//!     async fn start(&mut self, _control: &HostControl) -> bool { true }
//!     async fn stop(&mut self, _control: &HostControl) -> bool { true }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod configurator;
pub mod control;
pub mod descriptor;
pub mod environment;
pub mod error;
pub mod fault;
pub mod host;
pub mod service;
pub mod settings;
pub mod signal;
#[cfg(test)]
pub mod tests;
pub mod types;

pub use builder::{HostBuilder, HostOptions};
pub use config::{FaultConfig, HostConfig, LoggingConfig, property_env_name};
pub use configurator::HostConfigurator;
pub use control::{HostControl, ShutdownHandle};
pub use descriptor::ServiceDescriptor;
pub use environment::{HostEnvironment, PlatformRuntime};
pub use error::{HostError, Result};
pub use fault::{FaultGuard, FaultReporter, exempt_current_thread, install_panic_hook};
pub use host::RoleHost;
pub use service::{ServiceControl, ServiceHandle};
pub use settings::HostSettings;
pub use signal::{Latch, LifecycleSignals};
pub use types::{ExecutionContext, ExitCode, Fault, HostId, HostMode, HostState};
