//! Lifecycle hooks fired around policy deployments.

#![warn(missing_docs, clippy::pedantic)]

mod bus;
mod decision;

pub use bus::{DeployHook, DeployHookBus, HookError, HookRegistry, HookResult};
pub use decision::{HookDecision, HookVerdict};
