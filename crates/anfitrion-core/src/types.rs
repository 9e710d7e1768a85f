//! Core types for host lifecycle management.
//!
//! Per Iron Lotus Framework: UUIDs for stable IDs, explicit state
//! machines, no implicit transitions.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Unique identifier for a host (bridge) instance.
///
/// Only used to correlate log lines; one host exists per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostId(uuid::Uuid);

impl HostId {
    /// Creates a new random host ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for HostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the process is being hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostMode {
    /// Interactive console process.
    Console,
    /// Native OS service (systemd unit, launchd job).
    Service,
    /// Role instance inside a cloud worker-role runtime.
    Role,
}

impl HostMode {
    /// Returns the mode name as a static string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Service => "service",
            Self::Role => "role",
        }
    }

    /// Returns true if the platform's only restart primitive is a recycle
    /// of the whole process.
    #[must_use]
    pub const fn recycles_on_stop(&self) -> bool {
        matches!(self, Self::Role)
    }

    /// Returns true if the process is itself the supervised service
    /// instance, so an "already running" check would always match itself.
    #[must_use]
    pub const fn is_supervised_instance(&self) -> bool {
        matches!(self, Self::Service)
    }
}

impl fmt::Display for HostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lifecycle bridge state.
///
/// ```text
/// Created → Validating → Starting → Running → Stopping → Stopped
///                │           │          ↓          ↑
///                │           │       Faulted ──────┘
///                └───────────┴──────────────────────→ Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HostState {
    /// Bridge constructed, `run()` not entered yet.
    Created = 0,
    /// Checking the environment before starting.
    Validating = 1,
    /// Calling the service's start.
    Starting = 2,
    /// Service started, waiting for a stop request.
    Running = 3,
    /// An unhandled fault was contained while running.
    Faulted = 4,
    /// Calling the service's stop.
    Stopping = 5,
    /// Teardown finished.
    Stopped = 6,
}

impl HostState {
    /// Decodes a state stored as its discriminant.
    #[must_use]
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Created),
            1 => Some(Self::Validating),
            2 => Some(Self::Starting),
            3 => Some(Self::Running),
            4 => Some(Self::Faulted),
            5 => Some(Self::Stopping),
            6 => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Returns true if the state is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns true if the service has been started and not yet stopped.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Faulted)
    }

    /// Returns true if `next` is a legal successor of this state.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Validating)
                | (Self::Validating, Self::Starting)
                | (Self::Validating, Self::Stopped)
                | (Self::Starting, Self::Running)
                | (Self::Starting, Self::Stopped)
                | (Self::Running, Self::Faulted)
                | (Self::Running, Self::Stopping)
                | (Self::Faulted, Self::Stopping)
                | (Self::Stopping, Self::Stopped)
        )
    }
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Validating => "validating",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Faulted => "faulted",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Process exit codes reported to the supervising platform.
///
/// The numbering is stable; supervisors key restart policies on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum ExitCode {
    /// Clean shutdown.
    Ok = 0,
    /// Any fatal failure without a more specific code.
    AbnormalExit = 1,
    /// Configuration could not be loaded or was invalid.
    ConfigurationError = 2,
    /// The service refused or failed to start.
    StartServiceFailed = 5,
    /// The service refused or failed to stop.
    StopServiceFailed = 6,
    /// The installed OS service is running; the process never started.
    ServiceAlreadyRunning = 7,
    /// An unhandled fault was contained and re-surfaced at shutdown.
    UnhandledServiceException = 8,
    /// Shutdown completed because the service asked for a recycle.
    RecycleRequested = 9,
}

impl ExitCode {
    /// Returns the numeric exit code.
    #[must_use]
    pub const fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Decodes a numeric exit code.
    #[must_use]
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ok),
            1 => Some(Self::AbnormalExit),
            2 => Some(Self::ConfigurationError),
            5 => Some(Self::StartServiceFailed),
            6 => Some(Self::StopServiceFailed),
            7 => Some(Self::ServiceAlreadyRunning),
            8 => Some(Self::UnhandledServiceException),
            9 => Some(Self::RecycleRequested),
            _ => None,
        }
    }

    /// Returns true for a clean shutdown.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.as_i32() as u8)
    }
}

/// Where a piece of code is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Inside a task scheduled by the tokio runtime.
    Task,
    /// On a dedicated thread.
    Thread,
}

impl ExecutionContext {
    /// Inspects the calling context.
    #[must_use]
    pub fn current() -> Self {
        if tokio::task::try_id().is_some() {
            Self::Task
        } else {
            Self::Thread
        }
    }
}

/// Extracts the message of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with a non-string payload".to_string())
}

/// An unhandled fault captured by the fault guard.
#[derive(Debug, Clone)]
pub struct Fault {
    message: String,
    location: Option<String>,
    thread: Option<String>,
    context: ExecutionContext,
    observed_at: SystemTime,
}

impl Fault {
    /// Captures a fault raised on the calling thread or task.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            thread: std::thread::current().name().map(str::to_string),
            context: ExecutionContext::current(),
            observed_at: SystemTime::now(),
        }
    }

    /// Captures a fault from a panic hook invocation.
    #[must_use]
    pub fn from_panic(info: &std::panic::PanicHookInfo<'_>) -> Self {
        let mut fault = Self::new(panic_message(info.payload()));
        fault.location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
        fault
    }

    /// Attaches a source location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns the fault message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source location, if known.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the name of the faulting thread, if it had one.
    #[must_use]
    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Returns where the fault happened.
    #[must_use]
    pub const fn context(&self) -> ExecutionContext {
        self.context
    }

    /// Returns when the fault was observed.
    #[must_use]
    pub const fn observed_at(&self) -> SystemTime {
        self.observed_at
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Fault {}
