//! Policy deployer facade.
//!
//! Depend on this crate to get the deployment engine together with its store
//! contract. Hooks, configuration loading, and tracing integration sit behind
//! feature flags so embedders can leave out what they do not use.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use policy_primitives as primitives;

/// Policy store contract and in-memory store.
pub use policy_store as store;

/// Deployment engine and version rotation.
pub use policy_deploy as deploy;

/// Before/after deploy hooks (enabled by `hooks` feature).
#[cfg(feature = "hooks")]
pub use policy_hooks as hooks;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use policy_config as config;

/// Tracing setup and event rendering (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use policy_telemetry as telemetry;
