// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # anfitrion-platform
//!
//! Platform adapters for the anfitrion service host.
//!
//! Each adapter implements the collaborator contracts of `anfitrion-core`:
//!
//! - **Linux** (systemd): unit queries via `systemctl`, `sd_notify` readiness
//! - **macOS** (launchd): plist lookup and `launchctl list`
//! - **Console**: no service manager, recycle ends the process
//! - **Role**: cloud worker-role instance with a recycle hook
//!
//! ## Iron Lotus Framework
//!
//! - **Genchi Genbutsu**: Mode detection via direct observation of the environment
//! - **Poka-Yoke**: Detection falls back to the console
//! - **Standardized Work**: Every adapter implements the same two traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use anfitrion_platform::{detect_mode, detect_service_manager, select_environment, select_runtime};
//!
//! let mode = detect_mode();
//! let manager = detect_service_manager();
//! let environment = select_environment(manager, false);
//! let runtime = select_runtime(mode, manager);
//! ```

#![warn(missing_docs)]

pub mod console;
pub mod detect;
pub mod error;
pub mod launchd;
pub mod role;
pub mod select;
pub mod systemd;

pub use console::{ConsoleRuntime, DetachedEnvironment};
pub use detect::{ROLE_INSTANCE_ENV, ServiceManager, detect_mode, detect_mode_with, detect_service_manager};
pub use error::{PlatformError, Result};
pub use launchd::{LaunchdEnvironment, LaunchdRuntime};
pub use role::RoleRuntime;
pub use select::{select_environment, select_runtime};
pub use systemd::{NotifyTarget, SystemdEnvironment, SystemdNotifier};
