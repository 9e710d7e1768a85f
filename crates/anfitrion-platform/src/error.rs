//! Platform error types.

use anfitrion_core::HostError;

/// Result type alias for platform operations.
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Platform-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Platform not supported.
    #[error("platform not supported: {0}")]
    NotSupported(String),

    /// The service manager could not be queried.
    #[error("service manager query failed: {0}")]
    Query(String),

    /// A readiness or status notification could not be delivered.
    #[error("notification failed: {0}")]
    Notify(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlatformError {
    /// Creates a not supported error.
    #[must_use]
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a notification error.
    #[must_use]
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }
}

impl From<PlatformError> for HostError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotSupported(msg) => Self::unsupported(msg),
            PlatformError::Io(io) => Self::Io(io),
            other => Self::environment(other.to_string()),
        }
    }
}
