//! Linux systemd adapters.
//!
//! [`SystemdEnvironment`] answers the bridge's environment questions with
//! `systemctl`; [`SystemdNotifier`] speaks the `sd_notify` protocol for a
//! process running as a `Type=notify` unit.

use std::path::PathBuf;
use std::time::Duration;

use anfitrion_core::{HostEnvironment, HostMode, PlatformRuntime};
use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{PlatformError, Result};

/// Unit suffixes systemctl understands without `.service` appended.
const UNIT_SUFFIXES: &[&str] = &[
    ".service", ".socket", ".target", ".timer", ".path", ".mount", ".scope", ".slice",
];

/// systemd view of installed services.
///
/// # Requirements
///
/// - Linux with systemd
/// - `systemctl` on `PATH`
///
/// # Example
///
/// ```rust,ignore
/// use anfitrion_platform::SystemdEnvironment;
///
/// let environment = SystemdEnvironment::system();
/// let running = !environment.is_service_stopped("sample").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SystemdEnvironment {
    /// Use user session (--user) vs system session
    user_mode: bool,
}

impl SystemdEnvironment {
    /// Queries system-level units.
    #[must_use]
    pub const fn system() -> Self {
        Self { user_mode: false }
    }

    /// Queries units of the user's `systemd --user` session.
    #[must_use]
    pub const fn user() -> Self {
        Self { user_mode: true }
    }

    /// Returns whether user units are queried.
    #[must_use]
    pub const fn is_user_mode(&self) -> bool {
        self.user_mode
    }

    /// Returns the directory user units are installed to.
    #[must_use]
    pub fn user_unit_dir() -> Option<PathBuf> {
        dirs_next::config_dir().map(|p| p.join("systemd/user"))
    }

    /// Maps a service name onto a unit name.
    pub(crate) fn unit_name(service_name: &str) -> String {
        if UNIT_SUFFIXES.iter().any(|s| service_name.ends_with(s)) {
            service_name.to_string()
        } else {
            format!("{service_name}.service")
        }
    }

    /// Returns the template unit of an instance unit (`a@b.service` → `a@.service`).
    pub(crate) fn template_name(unit: &str) -> Option<String> {
        let (prefix, rest) = unit.split_once('@')?;
        let suffix = rest.rfind('.').map_or("", |i| &rest[i..]);
        Some(format!("{prefix}@{suffix}"))
    }

    /// Builds systemctl command with appropriate flags.
    fn systemctl_cmd(&self) -> Command {
        let mut cmd = Command::new("systemctl");
        if self.user_mode {
            cmd.arg("--user");
        }
        cmd
    }

    /// Returns true if `unit` appears in `list-unit-files` output.
    pub(crate) fn parse_unit_files(output: &str, unit: &str) -> bool {
        output
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .any(|name| name == unit)
    }

    /// Returns true if an `is-active` answer means the unit is not running.
    pub(crate) fn parse_is_active(output: &str) -> bool {
        !matches!(
            output.trim(),
            "active" | "reloading" | "activating" | "deactivating" | "refreshing"
        )
    }

    async fn list_unit_files(&self, pattern: &str) -> Result<String> {
        let mut cmd = self.systemctl_cmd();
        cmd.arg("list-unit-files")
            .arg("--no-legend")
            .arg("--no-pager")
            .arg(pattern);

        // Exit status 1 only means nothing matched.
        let output = cmd.output().await.map_err(|e| {
            PlatformError::query(format!("Failed to execute systemctl list-unit-files: {e}"))
        })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for SystemdEnvironment {
    fn default() -> Self {
        Self::system()
    }
}

#[async_trait]
impl HostEnvironment for SystemdEnvironment {
    async fn is_service_installed(&self, name: &str) -> anfitrion_core::Result<bool> {
        let unit = Self::unit_name(name);
        let listed = self.list_unit_files(&unit).await?;
        if Self::parse_unit_files(&listed, &unit) {
            return Ok(true);
        }

        let Some(template) = Self::template_name(&unit) else {
            return Ok(false);
        };
        let listed = self.list_unit_files(&template).await?;
        Ok(Self::parse_unit_files(&listed, &template))
    }

    async fn is_service_stopped(&self, name: &str) -> anfitrion_core::Result<bool> {
        let unit = Self::unit_name(name);
        let mut cmd = self.systemctl_cmd();
        cmd.arg("is-active").arg(&unit);

        // Non-zero exit just means "not active"; the answer is on stdout.
        let output = cmd.output().await.map_err(|e| {
            PlatformError::query(format!("Failed to execute systemctl is-active: {e}"))
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(unit = %unit, state = %stdout.trim(), "systemd unit state");
        Ok(Self::parse_is_active(&stdout))
    }
}

/// Where `sd_notify` datagrams go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyTarget {
    /// Filesystem socket.
    Path(PathBuf),
    /// Linux abstract socket (`@name` in `NOTIFY_SOCKET`).
    Abstract(Vec<u8>),
}

impl NotifyTarget {
    /// Parses a `NOTIFY_SOCKET` value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        match value.strip_prefix('@') {
            Some(name) => Some(Self::Abstract(name.as_bytes().to_vec())),
            None => Some(Self::Path(PathBuf::from(value))),
        }
    }
}

/// `sd_notify` client for a process running as a systemd unit.
///
/// Without `NOTIFY_SOCKET` every notification is a no-op.
#[derive(Debug, Clone, Default)]
pub struct SystemdNotifier {
    target: Option<NotifyTarget>,
}

impl SystemdNotifier {
    /// Reads `NOTIFY_SOCKET` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let target = std::env::var("NOTIFY_SOCKET")
            .ok()
            .and_then(|v| NotifyTarget::parse(&v));
        Self { target }
    }

    /// Notifies a specific target.
    #[must_use]
    pub const fn with_target(target: NotifyTarget) -> Self {
        Self {
            target: Some(target),
        }
    }

    /// Returns the notification target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&NotifyTarget> {
        self.target.as_ref()
    }

    /// Formats the grace-period extension message.
    pub(crate) fn extend_timeout_message(additional: Duration) -> String {
        format!("EXTEND_TIMEOUT_USEC={}", additional.as_micros())
    }

    /// Sends one notification datagram.
    ///
    /// # Errors
    /// Returns an error if the datagram could not be sent.
    pub fn notify(&self, message: &str) -> Result<()> {
        let Some(target) = &self.target else {
            return Ok(());
        };
        tracing::debug!(message = %message.replace('\n', " "), "sd_notify");
        send(target, message.as_bytes())
    }
}

impl PlatformRuntime for SystemdNotifier {
    fn mode(&self) -> HostMode {
        HostMode::Service
    }

    fn request_additional_time(&self, additional: Duration) -> anfitrion_core::Result<()> {
        self.notify(&Self::extend_timeout_message(additional)).map_err(Into::into)
    }

    fn request_recycle(&self) -> anfitrion_core::Result<()> {
        // The unit restarts on the recycle exit code.
        self.notify("STATUS=recycle requested").map_err(Into::into)
    }

    fn notify_running(&self) -> anfitrion_core::Result<()> {
        self.notify("READY=1\nSTATUS=running").map_err(Into::into)
    }

    fn notify_stopping(&self) -> anfitrion_core::Result<()> {
        self.notify("STOPPING=1\nSTATUS=stopping").map_err(Into::into)
    }
}

#[cfg(unix)]
fn send(target: &NotifyTarget, payload: &[u8]) -> Result<()> {
    use std::os::unix::net::UnixDatagram;

    let socket = UnixDatagram::unbound()?;
    match target {
        NotifyTarget::Path(path) => {
            socket
                .send_to(payload, path)
                .map_err(|e| PlatformError::notify(format!("{}: {e}", path.display())))?;
        }
        NotifyTarget::Abstract(name) => send_abstract(&socket, name, payload)?,
    }
    Ok(())
}

#[cfg(not(unix))]
fn send(_target: &NotifyTarget, _payload: &[u8]) -> Result<()> {
    Err(PlatformError::not_supported("sd_notify requires unix sockets"))
}

#[cfg(target_os = "linux")]
fn send_abstract(
    socket: &std::os::unix::net::UnixDatagram,
    name: &[u8],
    payload: &[u8],
) -> Result<()> {
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let addr = SocketAddr::from_abstract_name(name)?;
    socket
        .send_to_addr(payload, &addr)
        .map_err(|e| PlatformError::notify(format!("abstract socket: {e}")))?;
    Ok(())
}

#[cfg(all(unix, not(target_os = "linux")))]
fn send_abstract(
    _socket: &std::os::unix::net::UnixDatagram,
    _name: &[u8],
    _payload: &[u8],
) -> Result<()> {
    Err(PlatformError::not_supported("abstract sockets are Linux-only"))
}
