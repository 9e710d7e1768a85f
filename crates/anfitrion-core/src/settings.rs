//! Host settings shared by the bridge, the builder and the environment.
//!
//! # Toyota Way: Poka-Yoke (ポカヨケ)
//! Settings are validated once at configuration time and are read-only
//! afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// Immutable description of the hosted service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSettings {
    /// Service name as known to the OS service manager.
    pub service_name: String,

    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,

    /// Human-readable description.
    #[serde(default)]
    pub description: String,

    /// Instance name for templated services (`name@instance`).
    #[serde(default)]
    pub instance_name: Option<String>,

    /// Whether the service accepts stop requests.
    #[serde(default = "default_true")]
    pub can_stop: bool,

    /// Whether the service wants to be notified on system shutdown.
    #[serde(default)]
    pub can_shutdown: bool,
}

fn default_true() -> bool {
    true
}

impl HostSettings {
    /// Creates settings for the named service.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        Self {
            display_name: service_name.clone(),
            service_name,
            description: String::new(),
            instance_name: None,
            can_stop: true,
            can_shutdown: false,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the instance name.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance_name = Some(instance.into());
        self
    }

    /// Returns the name used to query the service manager.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.instance_name {
            Some(instance) => format!("{}@{}", self.service_name, instance),
            None => self.service_name.clone(),
        }
    }

    /// Validates the settings.
    ///
    /// # Errors
    /// Returns a configuration error if a name is empty or contains
    /// characters a service manager would reject.
    pub fn validate(&self) -> Result<()> {
        validate_name("service_name", &self.service_name)?;
        if let Some(instance) = &self.instance_name {
            validate_name("instance_name", instance)?;
        }
        Ok(())
    }
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(HostError::config(format!("{field} cannot be empty")));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(HostError::config(format!(
            "{field} must contain only ASCII alphanumerics, '-', '_' and '.'"
        )));
    }
    Ok(())
}
