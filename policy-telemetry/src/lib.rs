//! Observability for policy deploys.
//!
//! [`init_tracing`] installs the process-wide subscriber and
//! [`TracingObserver`] turns deploy events into structured log records.

#![warn(missing_docs, clippy::pedantic)]

mod observer;

pub use observer::TracingObserver;

use anyhow::{Context, anyhow};
use policy_config::TelemetryConfig;
use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber for the current process.
///
/// `RUST_LOG`, when set, takes precedence over the configured filter.
///
/// # Errors
///
/// Returns an error when the configured filter does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter())
            .with_context(|| format!("invalid tracing filter `{}`", config.filter()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi())
        .with_target(true)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("failed to install tracing subscriber")
}
