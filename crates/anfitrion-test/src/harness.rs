//! Host lifecycle test harness.
//!
//! # Toyota Way: Built-in Quality (品質の作り込み)
//! Quality cannot be inspected in; it must be built in.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anfitrion_core::{
    ExitCode, HostBuilder, HostError, HostMode, HostOptions, HostSettings, HostState, RoleHost,
    ServiceDescriptor, ServiceHandle, ShutdownHandle,
};
use tokio::task::JoinHandle;

use crate::doubles::{RecordingRuntime, ScriptedEnvironment};
use crate::error::{Result, TestError};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Test harness for host lifecycle testing.
///
/// Hosts run on a tokio task with a [`ScriptedEnvironment`] and a
/// [`RecordingRuntime`]. No process-wide state is touched: the panic hook
/// is not installed and the working directory is left alone.
pub struct HostTestHarness {
    mode: HostMode,
    settings: HostSettings,
    environment: Arc<ScriptedEnvironment>,
    runtime: Arc<RecordingRuntime>,
    options: HostOptions,
}

impl HostTestHarness {
    /// Creates a harness builder.
    #[must_use]
    pub fn builder() -> HostTestHarnessBuilder {
        HostTestHarnessBuilder::default()
    }

    /// Creates a console harness with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns the host mode under test.
    #[must_use]
    pub const fn mode(&self) -> HostMode {
        self.mode
    }

    /// Returns the scripted environment.
    #[must_use]
    pub fn environment(&self) -> Arc<ScriptedEnvironment> {
        self.environment.clone()
    }

    /// Returns the recording runtime.
    #[must_use]
    pub fn runtime(&self) -> Arc<RecordingRuntime> {
        self.runtime.clone()
    }

    fn builder_for_host(&self) -> HostBuilder {
        HostBuilder::new(self.mode)
            .settings(self.settings.clone())
            .environment(self.environment.clone())
            .runtime(self.runtime.clone())
            .options(self.options.clone())
    }

    /// Builds a host around `service` without running it.
    ///
    /// # Errors
    /// Returns an error if the builder rejects the configuration.
    pub fn build(&self, service: impl ServiceHandle + 'static) -> Result<RoleHost> {
        Ok(self.builder_for_host().build_with_handle(Box::new(service))?)
    }

    /// Builds a host around `service` and runs it on a new task.
    ///
    /// # Errors
    /// Returns an error if the builder rejects the configuration.
    pub fn spawn(&self, service: impl ServiceHandle + 'static) -> Result<RunningHost> {
        Ok(self.launch(self.build(service)?))
    }

    /// Builds a host from `descriptor` and runs it on a new task.
    ///
    /// # Errors
    /// Returns an error if the builder or the service factory fails.
    pub fn spawn_descriptor(&self, descriptor: ServiceDescriptor) -> Result<RunningHost> {
        Ok(self.launch(self.builder_for_host().build(descriptor)?))
    }

    fn launch(&self, mut host: RoleHost) -> RunningHost {
        let shutdown = host.shutdown_handle();
        let guard = host.fault_guard();

        tracing::debug!(id = %host.id(), mode = %self.mode, "spawning host under test");
        let task = tokio::spawn(async move { host.run().await });

        RunningHost {
            task,
            shutdown,
            guard,
        }
    }
}

impl Default for HostTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`HostTestHarness`].
pub struct HostTestHarnessBuilder {
    mode: HostMode,
    settings: HostSettings,
    environment: Option<Arc<ScriptedEnvironment>>,
    park_interval: Duration,
}

impl Default for HostTestHarnessBuilder {
    fn default() -> Self {
        Self {
            mode: HostMode::Console,
            settings: HostSettings::new("sample"),
            environment: None,
            park_interval: Duration::from_millis(50),
        }
    }
}

impl HostTestHarnessBuilder {
    /// Sets the host mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: HostMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the service settings.
    #[must_use]
    pub fn with_settings(mut self, settings: HostSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Uses a prepared environment instead of a detached one.
    #[must_use]
    pub fn with_environment(mut self, environment: Arc<ScriptedEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Sets how long parked threads sleep between wake-ups.
    #[must_use]
    pub const fn with_park_interval(mut self, interval: Duration) -> Self {
        self.park_interval = interval;
        self
    }

    /// Builds the harness.
    #[must_use]
    pub fn build(self) -> HostTestHarness {
        HostTestHarness {
            mode: self.mode,
            settings: self.settings,
            environment: self
                .environment
                .unwrap_or_else(|| Arc::new(ScriptedEnvironment::detached())),
            runtime: Arc::new(RecordingRuntime::new(self.mode)),
            options: HostOptions {
                change_working_dir: false,
                install_panic_hook: false,
                park_interval: self.park_interval,
            },
        }
    }
}

/// How a host run ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// Exit code the process would report.
    pub exit_code: ExitCode,
    /// The error `run()` returned, if any.
    pub error: Option<HostError>,
    /// State after `run()` returned.
    pub final_state: HostState,
    /// Threads the fault guard parked.
    pub parked_threads: u64,
}

impl RunOutcome {
    /// Returns true if the run ended with exit code 0.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.exit_code.is_success()
    }
}

/// A host running on a tokio task.
pub struct RunningHost {
    task: JoinHandle<anfitrion_core::Result<ExitCode>>,
    shutdown: ShutdownHandle,
    guard: Arc<anfitrion_core::FaultGuard>,
}

impl RunningHost {
    /// Returns the platform-side shutdown handle.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Returns the fault guard of the host.
    #[must_use]
    pub fn fault_guard(&self) -> Arc<anfitrion_core::FaultGuard> {
        self.guard.clone()
    }

    /// Returns the current host state.
    #[must_use]
    pub fn state(&self) -> HostState {
        self.shutdown.state()
    }

    /// Polls until the host reaches `expected`.
    ///
    /// # Errors
    /// Returns [`TestError::StateTimeout`] if the state is not reached in time.
    pub async fn wait_for_state(&self, expected: HostState, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            let actual = self.state();
            if actual == expected {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(TestError::StateTimeout {
                    expected,
                    actual,
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Stops the host the way the platform would and waits for the run to end.
    ///
    /// # Errors
    /// Returns an error if the host does not finish within `timeout`.
    pub async fn stop(self, timeout: Duration) -> Result<RunOutcome> {
        let shutdown = self.shutdown.clone();
        tokio::time::timeout(timeout, shutdown.stop())
            .await
            .map_err(|_| TestError::Timeout(timeout))?;
        self.join(timeout).await
    }

    /// Waits for the run to end on its own.
    ///
    /// # Errors
    /// Returns an error if the host does not finish within `timeout` or
    /// its task panicked.
    pub async fn join(self, timeout: Duration) -> Result<RunOutcome> {
        let result = tokio::time::timeout(timeout, self.task)
            .await
            .map_err(|_| TestError::Timeout(timeout))??;

        let (exit_code, error) = match result {
            Ok(code) => (code, None),
            Err(e) => (e.exit_code(), Some(e)),
        };
        tracing::debug!(exit_code = ?exit_code, "host under test finished");

        Ok(RunOutcome {
            exit_code,
            error,
            final_state: self.shutdown.state(),
            parked_threads: self.guard.parked_threads(),
        })
    }
}
