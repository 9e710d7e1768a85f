//! Adapter selection for the current machine.

use std::sync::Arc;

use anfitrion_core::{HostEnvironment, HostMode, PlatformRuntime};

use crate::console::{ConsoleRuntime, DetachedEnvironment};
use crate::detect::ServiceManager;
use crate::launchd::{LaunchdEnvironment, LaunchdRuntime};
use crate::role::RoleRuntime;
use crate::systemd::{SystemdEnvironment, SystemdNotifier};

/// Returns the environment adapter for a service manager.
///
/// `user_mode` selects the per-user systemd instance.
#[must_use]
pub fn select_environment(manager: ServiceManager, user_mode: bool) -> Arc<dyn HostEnvironment> {
    match manager {
        ServiceManager::Systemd if user_mode => Arc::new(SystemdEnvironment::user()),
        ServiceManager::Systemd => Arc::new(SystemdEnvironment::system()),
        ServiceManager::Launchd => Arc::new(LaunchdEnvironment::new()),
        ServiceManager::None => Arc::new(DetachedEnvironment),
    }
}

/// Returns the runtime adapter serving `mode`.
///
/// Service mode without a known service manager falls back to a runtime
/// whose primitives are no-ops.
#[must_use]
pub fn select_runtime(mode: HostMode, manager: ServiceManager) -> Arc<dyn PlatformRuntime> {
    match (mode, manager) {
        (HostMode::Console, _) => Arc::new(ConsoleRuntime::new()),
        (HostMode::Role, _) => Arc::new(RoleRuntime::from_env()),
        (HostMode::Service, ServiceManager::Systemd) => Arc::new(SystemdNotifier::from_env()),
        (HostMode::Service, ServiceManager::Launchd | ServiceManager::None) => {
            Arc::new(LaunchdRuntime)
        }
    }
}
