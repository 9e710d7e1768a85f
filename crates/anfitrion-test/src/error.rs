//! Test error types.

use std::time::Duration;

use anfitrion_core::HostState;

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, TestError>;

/// Testing errors.
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    /// Harness error.
    #[error("harness error: {0}")]
    Harness(String),

    /// Assertion failed.
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The host did not reach a state in time.
    #[error("timeout after {timeout:?} waiting for {expected} (last seen {actual})")]
    StateTimeout {
        /// State waited for.
        expected: HostState,
        /// State when the wait gave up.
        actual: HostState,
        /// How long the wait lasted.
        timeout: Duration,
    },

    /// Timeout.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The task running the host panicked or was cancelled.
    #[error("host task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Core host error.
    #[error("host error: {0}")]
    Host(#[from] anfitrion_core::HostError),

    /// Platform error.
    #[error("platform error: {0}")]
    Platform(#[from] anfitrion_platform::PlatformError),
}

impl TestError {
    /// Creates a harness error.
    #[must_use]
    pub fn harness(msg: impl Into<String>) -> Self {
        Self::Harness(msg.into())
    }

    /// Creates an assertion error.
    #[must_use]
    pub fn assertion(msg: impl Into<String>) -> Self {
        Self::Assertion(msg.into())
    }
}
