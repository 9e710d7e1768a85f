//! The lifecycle bridge.
//!
//! # Toyota Way: Standardized Work (標準作業)
//! Every host platform drives the service through the same sequence:
//! validate, start, wait, stop, release. Failures end the sequence early
//! but never skip teardown.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;

use crate::builder::HostOptions;
use crate::control::{HostControl, Shared, ShutdownHandle};
use crate::environment::{HostEnvironment, PlatformRuntime};
use crate::error::{HostError, Result};
use crate::fault::{FaultGuard, FaultReporter, install_panic_hook};
use crate::service::ServiceHandle;
use crate::settings::HostSettings;
use crate::types::{ExitCode, HostId, HostMode, HostState, panic_message};

/// Drives one hosted service through its lifecycle.
///
/// One instance per process. Build it with
/// [`HostBuilder`](crate::builder::HostBuilder).
pub struct RoleHost {
    shared: Arc<Shared>,
    environment: Arc<dyn HostEnvironment>,
    service: Option<Box<dyn ServiceHandle>>,
    guard: Arc<FaultGuard>,
    options: HostOptions,
}

impl RoleHost {
    pub(crate) fn new(
        settings: HostSettings,
        mode: HostMode,
        environment: Arc<dyn HostEnvironment>,
        runtime: Arc<dyn PlatformRuntime>,
        service: Box<dyn ServiceHandle>,
        options: HostOptions,
    ) -> Self {
        let shared = Arc::new(Shared::new(settings, mode, runtime));
        let guard = Arc::new(FaultGuard::new(shared.clone(), options.park_interval));
        Self {
            shared,
            environment,
            service: Some(service),
            guard,
            options,
        }
    }

    /// Returns the host ID.
    #[must_use]
    pub fn id(&self) -> HostId {
        self.shared.id
    }

    /// Returns the host settings.
    #[must_use]
    pub fn settings(&self) -> &HostSettings {
        &self.shared.settings
    }

    /// Returns the host mode.
    #[must_use]
    pub fn mode(&self) -> HostMode {
        self.shared.mode
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> HostState {
        self.shared.state()
    }

    /// Returns the capability handed to the service.
    #[must_use]
    pub fn control(&self) -> HostControl {
        HostControl::new(self.shared.clone())
    }

    /// Returns the platform's stop/recycle handle.
    ///
    /// Take it before calling [`RoleHost::run`]; `run` borrows the host
    /// until teardown completes.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(self.shared.clone())
    }

    /// Returns the explicit fault channel.
    #[must_use]
    pub fn fault_reporter(&self) -> FaultReporter {
        FaultReporter::new(self.guard.clone())
    }

    /// Returns the fault guard, for wiring panics from threads the host does
    /// not know about.
    #[must_use]
    pub fn fault_guard(&self) -> Arc<FaultGuard> {
        self.guard.clone()
    }

    /// Number of faulting threads parked so far.
    #[must_use]
    pub fn parked_threads(&self) -> u64 {
        self.guard.parked_threads()
    }

    /// Runs the service until a stop or recycle is requested.
    ///
    /// Returns once teardown completed. The handle is released exactly once
    /// on every path, and `exited` is set before this returns.
    ///
    /// # Errors
    /// - [`HostError::State`] if called more than once
    /// - [`HostError::StartFailed`] if the service refused, failed or panicked while starting
    /// - [`HostError::StopFailed`] if the service refused, failed or panicked while stopping
    /// - [`HostError::UnhandledFault`] if a fault was contained while running
    /// - [`HostError::Environment`] if the service manager could not be queried
    pub async fn run(&mut self) -> Result<ExitCode> {
        if self.shared.enter().is_err() {
            return Err(HostError::state("run() may only be called once"));
        }

        tracing::info!(
            id = %self.shared.id,
            service = %self.shared.settings.service_name,
            mode = %self.shared.mode,
            "host starting"
        );

        if self.options.change_working_dir {
            change_to_executable_dir();
        }
        if self.options.install_panic_hook {
            install_panic_hook(self.guard.clone());
        }

        let result = self.drive().await;
        self.teardown().await;

        match &result {
            Ok(code) => tracing::info!(id = %self.shared.id, exit_code = code.as_i32(), "host exited"),
            Err(e) => tracing::error!(
                id = %self.shared.id,
                exit_code = e.exit_code().as_i32(),
                error = %e,
                "host exited with error"
            ),
        }
        result
    }

    async fn drive(&mut self) -> Result<ExitCode> {
        if !self.shared.mode.is_supervised_instance()
            && is_already_running(self.environment.clone(), self.shared.settings.full_name()).await?
        {
            tracing::error!(
                id = %self.shared.id,
                service = %self.shared.settings.full_name(),
                "the service is already running as an installed service, stop it first"
            );
            return Ok(ExitCode::ServiceAlreadyRunning);
        }

        if self.shared.signals.exit.is_set() {
            tracing::info!(id = %self.shared.id, "stop requested before start, not starting");
            return Ok(ExitCode::Ok);
        }

        let control = HostControl::new(self.shared.clone());
        let service = self
            .service
            .as_mut()
            .ok_or_else(|| HostError::Internal("service handle already released".into()))?;

        self.shared.advance(HostState::Starting)?;
        match AssertUnwindSafe(service.start(&control)).catch_unwind().await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                return Err(HostError::start_failed(
                    "the service failed to start (return false)",
                ));
            }
            Ok(Err(e)) => {
                return Err(HostError::start_failed(format!(
                    "the service failed to start: {e}"
                )));
            }
            Err(payload) => {
                return Err(HostError::start_failed(format!(
                    "the service panicked while starting: {}",
                    panic_message(&*payload)
                )));
            }
        }

        self.shared.advance(HostState::Running)?;
        if let Err(e) = self.shared.runtime.notify_running() {
            tracing::warn!(id = %self.shared.id, error = %e, "failed to notify platform");
        }
        tracing::info!(
            id = %self.shared.id,
            service = %self.shared.settings.service_name,
            "service running"
        );

        self.shared.signals.exit.wait().await;

        let from = self.shared.advance(HostState::Stopping)?;
        tracing::info!(id = %self.shared.id, from = %from, "service stopping");
        if let Err(e) = self.shared.runtime.notify_stopping() {
            tracing::warn!(id = %self.shared.id, error = %e, "failed to notify platform");
        }

        match AssertUnwindSafe(service.stop(&control)).catch_unwind().await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                return Err(HostError::stop_failed(
                    "the service failed to stop (return false)",
                ));
            }
            Ok(Err(e)) => {
                return Err(HostError::stop_failed(format!(
                    "the service failed to stop: {e}"
                )));
            }
            Err(payload) => {
                return Err(HostError::stop_failed(format!(
                    "the service panicked while stopping: {}",
                    panic_message(&*payload)
                )));
            }
        }
        tracing::info!(id = %self.shared.id, "service stopped");

        if let Some(fault) = self.guard.take_fault() {
            return Err(HostError::UnhandledFault(fault));
        }
        if self.shared.recycle_requested() {
            return Ok(ExitCode::RecycleRequested);
        }
        Ok(ExitCode::Ok)
    }

    /// Releases the handle, reaches `Stopped` and sets `exited`.
    async fn teardown(&mut self) {
        if let Some(mut service) = self.service.take() {
            if let Err(payload) = AssertUnwindSafe(service.release()).catch_unwind().await {
                tracing::warn!(
                    id = %self.shared.id,
                    panic = %panic_message(&*payload),
                    "service panicked while releasing"
                );
            }
        }
        if let Err(e) = self.shared.advance(HostState::Stopped) {
            tracing::warn!(id = %self.shared.id, error = %e, "teardown from unexpected state");
        }
        self.shared.signals.exited.set();
    }
}

/// Takes owned arguments: the `run()` future must stay `Send`.
async fn is_already_running(environment: Arc<dyn HostEnvironment>, name: String) -> Result<bool> {
    if !environment.is_service_installed(&name).await? {
        return Ok(false);
    }
    Ok(!environment.is_service_stopped(&name).await?)
}

impl std::fmt::Debug for RoleHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleHost")
            .field("id", &self.shared.id)
            .field("mode", &self.shared.mode)
            .field("state", &self.shared.state())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn change_to_executable_dir() {
    let dir = match std::env::current_exe() {
        Ok(exe) => exe.parent().map(std::path::Path::to_path_buf),
        Err(e) => {
            tracing::warn!(error = %e, "cannot locate executable, keeping working directory");
            return;
        }
    };
    if let Some(dir) = dir {
        match std::env::set_current_dir(&dir) {
            Ok(()) => tracing::debug!(dir = %dir.display(), "working directory changed"),
            Err(e) => tracing::warn!(dir = %dir.display(), error = %e, "failed to change working directory"),
        }
    }
}
