//! Configuration loader implementations.

use std::path::Path;

use tracing::debug;

use crate::{ConfigResult, DeployerConfig};

impl DeployerConfig {
    /// Parses and validates configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialization`](crate::ConfigError::Serialization)
    /// for malformed JSON or unknown fields, and
    /// [`ConfigError::InvalidConfig`](crate::ConfigError::InvalidConfig) when a
    /// value is out of range.
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`](crate::ConfigError::Io) when the file cannot
    /// be read, plus any error from [`DeployerConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), "loaded deployer configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConfigError, DeployerConfig};

    fn temp_path() -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("deployer-config-{}.json", uuid::Uuid::new_v4()));
        path
    }

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let config =
            DeployerConfig::from_json_str(r#"{"engine": {"max_versions": 3}}"#).unwrap();
        assert_eq!(config.engine().max_versions(), 3);
        assert_eq!(
            config.engine().description(),
            "Policy generated by policy-deployer"
        );
        assert!(config.telemetry().ansi());
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(matches!(
            DeployerConfig::from_json_str(r#"{"engine": {"max_version": 3}}"#),
            Err(ConfigError::Serialization { .. })
        ));
        assert!(matches!(
            DeployerConfig::from_json_str(r#"{"engine": {"max_versions": 9}}"#),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn reads_from_disk() {
        let path = temp_path();
        std::fs::write(&path, r#"{"telemetry": {"filter": "policy_deploy=debug", "ansi": false}}"#)
            .unwrap();

        let config = DeployerConfig::from_path(&path).unwrap();
        assert_eq!(config.telemetry().filter(), "policy_deploy=debug");
        assert!(!config.telemetry().ansi());

        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            DeployerConfig::from_path(&path),
            Err(ConfigError::Io { .. })
        ));
    }
}
