//! Strongly typed configuration schemas.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Number of versions the policy store retains per policy.
const STORE_VERSION_CAP: usize = 5;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Settings consumed by the deployment engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    max_versions: usize,
    description: String,
}

impl EngineConfig {
    /// Creates a configuration with the provided retention cap and description.
    #[must_use]
    pub fn new(max_versions: usize, description: impl Into<String>) -> Self {
        Self {
            max_versions,
            description: description.into(),
        }
    }

    /// Returns how many versions may exist before the oldest is rotated out.
    #[must_use]
    pub const fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Returns the description attached to newly created policies.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the retention cap is outside
    /// `2..=5` or the description is too long.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_versions < 2 {
            return Err(ConfigError::InvalidConfig(
                "max_versions must leave room for a non-default version",
            ));
        }
        if self.max_versions > STORE_VERSION_CAP {
            return Err(ConfigError::InvalidConfig(
                "max_versions cannot exceed the store's cap of 5",
            ));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ConfigError::InvalidConfig(
                "description cannot exceed 1000 characters",
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_versions: STORE_VERSION_CAP,
            description: "Policy generated by policy-deployer".into(),
        }
    }
}

/// Settings for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    filter: String,
    ansi: bool,
}

impl TelemetryConfig {
    /// Creates a telemetry configuration with the given filter directive.
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }

    /// Enables or disables ANSI colouring.
    #[must_use]
    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Returns the default `tracing` filter directive.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns whether log output is coloured.
    #[must_use]
    pub const fn ansi(&self) -> bool {
        self.ansi
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] when the filter is blank.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("telemetry filter cannot be empty"));
        }
        Ok(())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            ansi: true,
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployerConfig {
    engine: EngineConfig,
    telemetry: TelemetryConfig,
}

impl DeployerConfig {
    /// Assembles a configuration from its sections.
    #[must_use]
    pub fn new(engine: EngineConfig, telemetry: TelemetryConfig) -> Self {
        Self { engine, telemetry }
    }

    /// Returns the engine section.
    #[must_use]
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns the telemetry section.
    #[must_use]
    pub fn telemetry(&self) -> &TelemetryConfig {
        &self.telemetry
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidConfig`] found.
    pub fn validate(&self) -> ConfigResult<()> {
        self.engine.validate()?;
        self.telemetry.validate()
    }
}
