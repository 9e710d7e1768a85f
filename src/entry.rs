//! Process entry point.
//!
//! Loads configuration, lets the application register its service, picks
//! the adapters for the detected host mode and runs the bridge until the
//! platform or the service stops it.

use anfitrion_core::{
    ExitCode, HostBuilder, HostConfig, HostConfigurator, HostOptions, LoggingConfig, Result,
    RoleHost, ShutdownHandle,
};
use anfitrion_platform::{detect_mode, detect_service_manager, select_environment, select_runtime};
use tokio::task::JoinHandle;

use crate::logging;

/// Names the TOML file the entry point loads.
pub const CONFIG_ENV: &str = "ANFITRION_CONFIG";

const FALLBACK_SERVICE_NAME: &str = "anfitrion";

/// Loads configuration and runs the configured service to completion.
///
/// The configuration comes from the file named by `$ANFITRION_CONFIG`, or
/// defaults to a service named after the executable. Every failure is
/// logged and mapped onto its exit code.
///
/// # Example
///
/// ```rust,no_run
/// use anfitrion::prelude::*;
///
/// struct Sample;
///
/// #[async_trait]
/// impl ServiceControl for Sample {
///     async fn start(&mut self, _control: &HostControl) -> bool { true }
///     async fn stop(&mut self, _control: &HostControl) -> bool { true }
/// }
///
/// #[tokio::main]
/// async fn main() -> std::process::ExitCode {
///     anfitrion::run(|host| {
///         host.service(|_settings| Ok(Sample));
///         Ok(())
///     })
///     .await
///     .into()
/// }
/// ```
pub async fn run<F>(configure: F) -> ExitCode
where
    F: FnOnce(&mut HostConfigurator) -> Result<()>,
{
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init(&LoggingConfig::default());
            tracing::error!(error = %e, "failed to load host configuration");
            return e.exit_code();
        }
    };
    logging::init(&config.logging);
    run_with(config, configure).await
}

/// Runs with an already loaded configuration. Does not touch logging.
pub async fn run_with<F>(config: HostConfig, configure: F) -> ExitCode
where
    F: FnOnce(&mut HostConfigurator) -> Result<()>,
{
    let mut host = match prepare(config, configure) {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(error = %e, "host could not be built");
            return e.exit_code();
        }
    };

    let signals = bind_signals(host.shutdown_handle());
    let result = host.run().await;
    signals.abort();
    result.unwrap_or_else(|e| e.exit_code())
}

fn prepare<F>(config: HostConfig, configure: F) -> Result<RoleHost>
where
    F: FnOnce(&mut HostConfigurator) -> Result<()>,
{
    let mut configurator = HostConfigurator::new(config);
    configure(&mut configurator)?;
    let (config, descriptor) = configurator.into_parts()?;

    let mode = config.mode.unwrap_or_else(detect_mode);
    let manager = detect_service_manager();
    tracing::debug!(mode = %mode, manager = %manager, "selected host adapters");

    HostBuilder::new(mode)
        .settings(config.settings.clone())
        .environment(select_environment(manager, false))
        .runtime(select_runtime(mode, manager))
        .options(HostOptions::from(&config))
        .build(descriptor)
}

/// Loads `$ANFITRION_CONFIG`, or defaults named after the executable.
///
/// # Errors
/// Returns a configuration error if the named file cannot be read or parsed.
pub fn load_config() -> Result<HostConfig> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            tracing::debug!(path = ?path, "loading host configuration");
            HostConfig::load(path)
        }
        None => Ok(HostConfig::new(default_service_name())),
    }
}

fn default_service_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .map(|stem| sanitize_service_name(&stem))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_SERVICE_NAME.to_string())
}

/// Maps anything outside `[A-Za-z0-9_.-]` to `-`.
fn sanitize_service_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Stops the host on Ctrl+C or SIGTERM.
fn bind_signals(shutdown: ShutdownHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("termination signal received, stopping");
        shutdown.stop().await;
    })
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                () = wait_for_ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anfitrion_core::{HostControl, HostError, HostMode, ServiceControl};
    use async_trait::async_trait;

    struct OneShot;

    #[async_trait]
    impl ServiceControl for OneShot {
        async fn start(&mut self, control: &HostControl) -> bool {
            control.stop();
            true
        }

        async fn stop(&mut self, _control: &HostControl) -> bool {
            true
        }
    }

    fn service_config() -> HostConfig {
        let mut config = HostConfig::new("sample");
        config.mode = Some(HostMode::Service);
        config.change_working_dir = false;
        config.faults.install_panic_hook = false;
        config
    }

    #[test]
    fn test_sanitize_service_name() {
        assert_eq!(sanitize_service_name("sample_worker"), "sample_worker");
        assert_eq!(sanitize_service_name("my worker+1"), "my-worker-1");
    }

    #[test]
    fn test_default_service_name_is_valid() {
        let name = default_service_name();
        assert!(!name.is_empty());
        assert!(HostConfig::new(name).validate().is_ok());
    }

    #[tokio::test]
    async fn test_run_with_clean_exit() {
        let code = run_with(service_config(), |host| {
            host.service(|_settings| Ok(OneShot));
            Ok(())
        })
        .await;
        assert_eq!(code, ExitCode::Ok);
    }

    #[tokio::test]
    async fn test_run_with_without_service() {
        let code = run_with(service_config(), |_host| Ok(())).await;
        assert_eq!(code, ExitCode::ConfigurationError);
    }

    #[tokio::test]
    async fn test_run_with_configure_error() {
        let code = run_with(service_config(), |_host| {
            Err(HostError::config("test_phrase is missing"))
        })
        .await;
        assert_eq!(code, ExitCode::ConfigurationError);
    }
}
