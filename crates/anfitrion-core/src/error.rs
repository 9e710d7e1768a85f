//! Error types for anfitrion-core.
//!
//! Per Iron Lotus Framework: All errors are explicit, no panics allowed.
//! Every failure the bridge detects is fatal for the process; the
//! supervising platform decides whether to restart it.

use crate::types::{ExitCode, Fault};

/// Result type alias for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Comprehensive error type for host lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// Configuration error (no service descriptor, invalid settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// A required collaborator or argument was not supplied.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The hosted service refused or failed to start.
    #[error("start failed: {0}")]
    StartFailed(String),

    /// The hosted service refused or failed to stop.
    #[error("stop failed: {0}")]
    StopFailed(String),

    /// An unhandled fault was contained while the service was running.
    #[error("the service faulted while running: {0}")]
    UnhandledFault(#[source] Fault),

    /// The requested capability is not available in the current host mode.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The host environment could not answer a query.
    #[error("environment error: {0}")]
    Environment(String),

    /// Invalid state for operation.
    #[error("invalid state: {0}")]
    State(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (should not occur in production).
    #[error("internal error: {0}")]
    Internal(String),
}

impl HostError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a start failure.
    #[must_use]
    pub fn start_failed(msg: impl Into<String>) -> Self {
        Self::StartFailed(msg.into())
    }

    /// Creates a stop failure.
    #[must_use]
    pub fn stop_failed(msg: impl Into<String>) -> Self {
        Self::StopFailed(msg.into())
    }

    /// Creates an unsupported operation error.
    #[must_use]
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Creates an environment query error.
    #[must_use]
    pub fn environment(msg: impl Into<String>) -> Self {
        Self::Environment(msg.into())
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Maps the error onto the process exit code reported to the platform.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::ConfigurationError,
            Self::StartFailed(_) => ExitCode::StartServiceFailed,
            Self::StopFailed(_) => ExitCode::StopServiceFailed,
            Self::UnhandledFault(_) => ExitCode::UnhandledServiceException,
            Self::InvalidArgument(_)
            | Self::Unsupported(_)
            | Self::Environment(_)
            | Self::State(_)
            | Self::Io(_)
            | Self::Internal(_) => ExitCode::AbnormalExit,
        }
    }

    /// Returns the contained fault, if this error re-surfaces one.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::UnhandledFault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns true if the error happened before the service was started.
    #[must_use]
    pub const fn is_pre_start(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::InvalidArgument(_) | Self::Environment(_)
        )
    }
}
