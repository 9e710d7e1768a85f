//! Host configuration types.
//!
//! Per Iron Lotus Framework: Configuration is validated at load time (Poka-Yoke),
//! with sensible defaults and clear error messages.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};
use crate::settings::HostSettings;
use crate::types::HostMode;

/// Environment variable prefix for property overrides.
pub const PROPERTY_ENV_PREFIX: &str = "ANFITRION_";

/// Host configuration.
///
/// ```toml
/// mode = "role"
///
/// [settings]
/// service_name = "sample"
/// display_name = "Sample Worker"
///
/// [faults]
/// park_interval = "1h"
///
/// [properties]
/// test_phrase = "hello"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Service settings.
    pub settings: HostSettings,

    /// Forces a host mode instead of detecting it.
    #[serde(default)]
    pub mode: Option<HostMode>,

    /// Switch the working directory to the executable's directory on run.
    #[serde(default = "default_true")]
    pub change_working_dir: bool,

    /// Unhandled-fault handling.
    #[serde(default)]
    pub faults: FaultConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Free-form application settings.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl HostConfig {
    /// Creates a configuration for the named service with defaults.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            settings: HostSettings::new(service_name),
            mode: None,
            change_working_dir: true,
            faults: FaultConfig::default(),
            logging: LoggingConfig::default(),
            properties: BTreeMap::new(),
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        self.faults.validate()?;
        Ok(())
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| HostError::config(format!("failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed or is invalid.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| HostError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Looks up an application setting.
    ///
    /// `ANFITRION_<KEY>` (upper-cased, `-` and `.` mapped to `_`) overrides
    /// the `[properties]` table.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<String> {
        std::env::var(property_env_name(key))
            .ok()
            .or_else(|| self.properties.get(key).cloned())
    }
}

/// Returns the environment variable that overrides a property.
#[must_use]
pub fn property_env_name(key: &str) -> String {
    let suffix: String = key
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();
    format!("{PROPERTY_ENV_PREFIX}{suffix}")
}

/// Unhandled-fault handling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Install the process-wide panic hook when the host runs.
    #[serde(default = "default_true")]
    pub install_panic_hook: bool,

    /// Sleep interval of a parked faulting thread.
    #[serde(default = "default_park_interval")]
    #[serde(with = "humantime_serde")]
    pub park_interval: Duration,
}

fn default_park_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            install_panic_hook: true,
            park_interval: default_park_interval(),
        }
    }
}

impl FaultConfig {
    /// Validates fault handling settings.
    ///
    /// # Errors
    /// Returns an error if the park interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.park_interval.is_zero() {
            return Err(HostError::config("park_interval must be greater than 0"));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive; `RUST_LOG` wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Emit ANSI colours.
    #[serde(default = "default_true")]
    pub ansi: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            ansi: true,
        }
    }
}

/// Serde helper for humantime durations.
pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serializes a duration as a human-readable string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    /// Deserializes a duration from a human-readable string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
