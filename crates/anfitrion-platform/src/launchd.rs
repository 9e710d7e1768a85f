//! macOS launchd adapter.
//!
//! Installed jobs are found by their plist; running jobs by the `PID` entry
//! `launchctl list <label>` reports.

use std::path::{Path, PathBuf};

use anfitrion_core::{HostEnvironment, HostMode, PlatformRuntime};
use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{PlatformError, Result};

/// launchd view of installed jobs.
///
/// The service name is used as the job label.
///
/// # Example
///
/// ```rust,ignore
/// use anfitrion_platform::LaunchdEnvironment;
///
/// let environment = LaunchdEnvironment::new();
/// let installed = environment.is_service_installed("com.example.sample").await?;
/// ```
#[derive(Debug, Clone)]
pub struct LaunchdEnvironment {
    /// Directories searched for `<label>.plist`
    plist_dirs: Vec<PathBuf>,
}

impl LaunchdEnvironment {
    /// Searches the system daemon and agent directories plus the user's
    /// LaunchAgents.
    #[must_use]
    pub fn new() -> Self {
        let mut plist_dirs = vec![
            PathBuf::from("/Library/LaunchDaemons"),
            PathBuf::from("/Library/LaunchAgents"),
        ];
        if let Some(home) = dirs_next::home_dir() {
            plist_dirs.push(home.join("Library/LaunchAgents"));
        }
        Self { plist_dirs }
    }

    /// Searches only the given directories.
    #[must_use]
    pub fn with_plist_dirs(plist_dirs: Vec<PathBuf>) -> Self {
        Self { plist_dirs }
    }

    /// Returns the searched directories.
    #[must_use]
    pub fn plist_dirs(&self) -> &[PathBuf] {
        &self.plist_dirs
    }

    fn plist_path(dir: &Path, label: &str) -> PathBuf {
        dir.join(format!("{label}.plist"))
    }

    /// Extracts the PID from `launchctl list <label>` output.
    ///
    /// ```text
    /// {
    ///     "Label" = "com.example.sample";
    ///     "PID" = 4242;
    /// };
    /// ```
    pub(crate) fn parse_pid(output: &str) -> Option<u32> {
        output
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("\"PID\""))
            .and_then(|line| line.split('=').nth(1))
            .and_then(|value| value.trim().trim_end_matches(';').trim().parse().ok())
    }
}

impl Default for LaunchdEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostEnvironment for LaunchdEnvironment {
    async fn is_service_installed(&self, name: &str) -> anfitrion_core::Result<bool> {
        validate_label(name)?;
        for dir in &self.plist_dirs {
            let path = Self::plist_path(dir, name);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                tracing::debug!(plist = %path.display(), "launchd job installed");
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn is_service_stopped(&self, name: &str) -> anfitrion_core::Result<bool> {
        validate_label(name)?;
        let output = Command::new("launchctl")
            .arg("list")
            .arg(name)
            .output()
            .await
            .map_err(|e| PlatformError::query(format!("Failed to execute launchctl: {e}")))?;

        // Not loaded.
        if !output.status.success() {
            return Ok(true);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(Self::parse_pid(&stdout).is_none())
    }
}

/// Runtime for a launchd job.
///
/// launchd has no readiness or grace-period protocol. A recycle relies on
/// `KeepAlive` restarting the job once the process exits.
#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchdRuntime;

impl PlatformRuntime for LaunchdRuntime {
    fn mode(&self) -> HostMode {
        HostMode::Service
    }

    fn request_recycle(&self) -> anfitrion_core::Result<()> {
        tracing::info!("recycle requested, launchd restarts the job on exit");
        Ok(())
    }
}

/// Checks the label is usable as a plist file name.
///
/// # Errors
/// Returns an error if the label contains a path separator.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() || label.contains('/') {
        return Err(PlatformError::query(format!("invalid launchd label: {label:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dirs() {
        let environment = LaunchdEnvironment::new();
        assert!(
            environment
                .plist_dirs()
                .contains(&PathBuf::from("/Library/LaunchDaemons"))
        );
    }

    #[test]
    fn test_parse_pid_running() {
        let output = "{\n\t\"LimitLoadToSessionType\" = \"System\";\n\t\"Label\" = \"com.example.sample\";\n\t\"PID\" = 4242;\n};\n";
        assert_eq!(LaunchdEnvironment::parse_pid(output), Some(4242));
    }

    #[test]
    fn test_parse_pid_stopped() {
        let output = "{\n\t\"Label\" = \"com.example.sample\";\n\t\"LastExitStatus\" = 0;\n};\n";
        assert_eq!(LaunchdEnvironment::parse_pid(output), None);
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("com.example.sample").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("../etc").is_err());
    }

    #[test]
    fn test_runtime_serves_service_mode() {
        assert_eq!(LaunchdRuntime.mode(), HostMode::Service);
        assert!(LaunchdRuntime.request_recycle().is_ok());
    }

    #[tokio::test]
    async fn test_installed_by_plist() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("com.example.sample.plist"), "<plist/>").unwrap();

        let environment = LaunchdEnvironment::with_plist_dirs(vec![
            PathBuf::from("/nonexistent/LaunchDaemons"),
            dir.path().to_path_buf(),
        ]);

        assert!(environment.is_service_installed("com.example.sample").await.unwrap());
        assert!(!environment.is_service_installed("com.example.other").await.unwrap());
    }
}
