//! Host mode and service manager detection.
//!
//! # Toyota Way: Poka-Yoke (ポカヨケ)
//! Detection falls back to the safest option: an interactive console with
//! no service manager.
//!
//! # Detection Order
//! 1. Role: the cloud role runtime exports `ANFITRION_ROLE_INSTANCE`
//! 2. Service: systemd exports `INVOCATION_ID`/`NOTIFY_SOCKET`, launchd
//!    exports `XPC_SERVICE_NAME`
//! 3. Fallback: console

use std::path::Path;

use anfitrion_core::HostMode;

/// Set by the cloud role runtime for every role instance it launches.
pub const ROLE_INSTANCE_ENV: &str = "ANFITRION_ROLE_INSTANCE";

/// OS service manager available on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceManager {
    /// Linux with systemd.
    Systemd,
    /// macOS with launchd.
    Launchd,
    /// No service manager the host knows how to query.
    None,
}

impl ServiceManager {
    /// Returns the manager name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Systemd => "systemd",
            Self::Launchd => "launchd",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for ServiceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Detects how the current process is hosted.
#[must_use]
pub fn detect_mode() -> HostMode {
    detect_mode_with(|key| std::env::var(key).ok())
}

/// Detects the host mode from an environment lookup.
#[must_use]
pub fn detect_mode_with(lookup: impl Fn(&str) -> Option<String>) -> HostMode {
    let present = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());

    if present(ROLE_INSTANCE_ENV) {
        return HostMode::Role;
    }

    // systemd sets both for services; NOTIFY_SOCKET alone covers Type=notify.
    if present("INVOCATION_ID") || present("NOTIFY_SOCKET") {
        return HostMode::Service;
    }

    // launchd jobs get their label; "0" marks an interactive session.
    if lookup("XPC_SERVICE_NAME").is_some_and(|v| !v.is_empty() && v != "0") {
        return HostMode::Service;
    }

    HostMode::Console
}

/// Detects the service manager of this machine.
#[must_use]
pub fn detect_service_manager() -> ServiceManager {
    if cfg!(target_os = "macos") {
        return ServiceManager::Launchd;
    }
    if cfg!(target_os = "linux") && Path::new("/run/systemd/system").exists() {
        return ServiceManager::Systemd;
    }
    ServiceManager::None
}
