// Iron Lotus: Allow unwrap/expect in tests for clear failure messages
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! # anfitrion-test
//!
//! Testing infrastructure for the anfitrion service host.
//!
//! This crate provides:
//! - **Test harness**: run a host on a tokio task and drive it like a platform would
//! - **Test doubles**: a scripted service, service manager and platform runtime
//! - **Falsification tests**: Popperian tests for the lifecycle contract
//!
//! ## Iron Lotus Framework
//!
//! - **Built-in Quality** (品質の作り込み): Quality cannot be inspected in
//! - **Popperian Falsification**: Tests designed to refute claims
//!
//! ## Example
//!
//! ```rust,ignore
//! use anfitrion_test::{HostTestHarness, SpyService};
//!
//! let harness = HostTestHarness::builder().with_mode(HostMode::Role).build();
//! let (service, probe) = SpyService::new();
//!
//! let running = harness.spawn(service)?;
//! running.wait_for_state(HostState::Running, Duration::from_secs(1)).await?;
//! let outcome = running.stop(Duration::from_secs(1)).await?;
//! assert_eq!(outcome.exit_code, ExitCode::RecycleRequested);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod doubles;
pub mod error;
pub mod harness;

pub use doubles::{
    Outcome, RecordingRuntime, RuntimeCall, ScriptedEnvironment, ServiceCall, SpyProbe,
    SpyService, StartAction,
};
pub use error::{Result, TestError};
pub use harness::{HostTestHarness, HostTestHarnessBuilder, RunOutcome, RunningHost};
