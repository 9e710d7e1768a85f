//! Configuration surface handed to the embedding application.

use crate::config::HostConfig;
use crate::descriptor::ServiceDescriptor;
use crate::error::{HostError, Result};
use crate::service::ServiceControl;
use crate::settings::HostSettings;

/// Collects settings and the service descriptor inside a configuration
/// function.
///
/// ```rust,ignore
/// anfitrion::run(|host| {
///     host.settings_mut().description = "Sample worker".into();
///     let phrase = host.setting("test_phrase").unwrap_or_default();
///     host.service(move |_| Ok(SampleService::new(phrase)));
///     Ok(())
/// })
/// ```
#[derive(Debug)]
pub struct HostConfigurator {
    config: HostConfig,
    descriptor: Option<ServiceDescriptor>,
}

impl HostConfigurator {
    /// Wraps a loaded configuration.
    #[must_use]
    pub const fn new(config: HostConfig) -> Self {
        Self {
            config,
            descriptor: None,
        }
    }

    /// Registers the hosted service.
    ///
    /// Registering twice replaces the first descriptor.
    pub fn service<S, F>(&mut self, factory: F) -> &mut ServiceDescriptor
    where
        S: ServiceControl,
        F: FnOnce(&HostSettings) -> Result<S> + Send + 'static,
    {
        if self.descriptor.is_some() {
            tracing::warn!("service registered twice, keeping the last one");
        }
        self.descriptor.insert(ServiceDescriptor::new(factory))
    }

    /// Returns the service settings for editing.
    pub fn settings_mut(&mut self) -> &mut HostSettings {
        &mut self.config.settings
    }

    /// Returns the service settings.
    #[must_use]
    pub const fn settings(&self) -> &HostSettings {
        &self.config.settings
    }

    /// Returns the whole configuration for editing.
    pub fn config_mut(&mut self) -> &mut HostConfig {
        &mut self.config
    }

    /// Reads an application setting, environment override first.
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<String> {
        self.config.property(key)
    }

    /// Splits into the final configuration and the service descriptor.
    ///
    /// # Errors
    /// Returns a configuration error if no service was registered or the
    /// edited configuration is invalid.
    pub fn into_parts(self) -> Result<(HostConfig, ServiceDescriptor)> {
        let descriptor = self
            .descriptor
            .ok_or_else(|| HostError::config("no service was configured"))?;
        self.config.validate()?;
        Ok((self.config, descriptor))
    }
}
