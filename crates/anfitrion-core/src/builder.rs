//! Host construction.
//!
//! # Toyota Way: Poka-Yoke (ポカヨケ)
//! A host cannot be built with a missing collaborator or invalid settings;
//! the error surfaces before anything starts.

use std::sync::Arc;
use std::time::Duration;

use crate::config::HostConfig;
use crate::descriptor::ServiceDescriptor;
use crate::environment::{HostEnvironment, PlatformRuntime};
use crate::error::{HostError, Result};
use crate::host::RoleHost;
use crate::service::ServiceHandle;
use crate::settings::HostSettings;
use crate::types::HostMode;

/// Behaviour switches for a built host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOptions {
    /// Switch to the executable's directory when `run()` starts.
    pub change_working_dir: bool,
    /// Route process panics through the fault guard.
    ///
    /// Worker threads whose panics are caught or joined must call
    /// [`exempt_current_thread`](crate::fault::exempt_current_thread), or
    /// the hook parks them; see
    /// [`install_panic_hook`](crate::fault::install_panic_hook).
    pub install_panic_hook: bool,
    /// Sleep interval of parked faulting threads.
    pub park_interval: Duration,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            change_working_dir: true,
            install_panic_hook: true,
            park_interval: Duration::from_secs(60 * 60),
        }
    }
}

impl From<&HostConfig> for HostOptions {
    fn from(config: &HostConfig) -> Self {
        Self {
            change_working_dir: config.change_working_dir,
            install_panic_hook: config.faults.install_panic_hook,
            park_interval: config.faults.park_interval,
        }
    }
}

/// Wires settings, environment and runtime into a [`RoleHost`].
///
/// # Example
///
/// ```rust,ignore
/// let host = HostBuilder::new(HostMode::Console)
///     .settings(HostSettings::new("sample"))
///     .environment(Arc::new(DetachedEnvironment))
///     .runtime(Arc::new(ConsoleRuntime::new()))
///     .build(descriptor)?;
/// ```
pub struct HostBuilder {
    mode: HostMode,
    settings: Option<HostSettings>,
    environment: Option<Arc<dyn HostEnvironment>>,
    runtime: Option<Arc<dyn PlatformRuntime>>,
    options: HostOptions,
}

impl HostBuilder {
    /// Starts a builder for the given mode.
    #[must_use]
    pub fn new(mode: HostMode) -> Self {
        Self {
            mode,
            settings: None,
            environment: None,
            runtime: None,
            options: HostOptions::default(),
        }
    }

    /// Sets the host settings.
    #[must_use]
    pub fn settings(mut self, settings: HostSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Sets the service-manager view.
    #[must_use]
    pub fn environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Sets the platform runtime.
    #[must_use]
    pub fn runtime(mut self, runtime: Arc<dyn PlatformRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Overrides the default options.
    #[must_use]
    pub fn options(mut self, options: HostOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the host, constructing the service from `descriptor`.
    ///
    /// # Errors
    /// Returns [`HostError::InvalidArgument`] if a collaborator is missing,
    /// a configuration error if the settings are invalid, and whatever the
    /// service factory returns.
    pub fn build(self, descriptor: ServiceDescriptor) -> Result<RoleHost> {
        let parts = self.into_parts()?;
        let handle = descriptor.build(&parts.settings)?;
        Ok(parts.assemble(handle))
    }

    /// Builds the host around an existing handle.
    ///
    /// # Errors
    /// Same as [`HostBuilder::build`], minus factory errors.
    pub fn build_with_handle(self, handle: Box<dyn ServiceHandle>) -> Result<RoleHost> {
        Ok(self.into_parts()?.assemble(handle))
    }

    fn into_parts(self) -> Result<Parts> {
        let settings = self
            .settings
            .ok_or_else(|| HostError::invalid_argument("host settings are required"))?;
        let environment = self
            .environment
            .ok_or_else(|| HostError::invalid_argument("a host environment is required"))?;
        let runtime = self
            .runtime
            .ok_or_else(|| HostError::invalid_argument("a platform runtime is required"))?;

        if runtime.mode() != self.mode {
            return Err(HostError::invalid_argument(format!(
                "runtime serves {} but the host runs as {}",
                runtime.mode(),
                self.mode
            )));
        }
        if self.options.park_interval.is_zero() {
            return Err(HostError::invalid_argument("park_interval must be greater than 0"));
        }
        settings.validate()?;

        Ok(Parts {
            mode: self.mode,
            settings,
            environment,
            runtime,
            options: self.options,
        })
    }
}

impl std::fmt::Debug for HostBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBuilder")
            .field("mode", &self.mode)
            .field("settings", &self.settings)
            .field("has_environment", &self.environment.is_some())
            .field("has_runtime", &self.runtime.is_some())
            .field("options", &self.options)
            .finish()
    }
}

struct Parts {
    mode: HostMode,
    settings: HostSettings,
    environment: Arc<dyn HostEnvironment>,
    runtime: Arc<dyn PlatformRuntime>,
    options: HostOptions,
}

impl Parts {
    fn assemble(self, handle: Box<dyn ServiceHandle>) -> RoleHost {
        RoleHost::new(
            self.settings,
            self.mode,
            self.environment,
            self.runtime,
            handle,
            self.options,
        )
    }
}
