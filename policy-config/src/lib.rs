//! Configuration management for the policy deployer.
//!
//! Configuration is read from JSON. Every section and field is optional and
//! falls back to the defaults documented on each type.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use schema::{DeployerConfig, EngineConfig, TelemetryConfig};
