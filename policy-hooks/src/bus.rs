//! Hook bus contract and a registry-backed implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use policy_primitives::{DeployResult, PolicyDocument};
use thiserror::Error;
use tracing::{debug, warn};

use crate::decision::HookDecision;

/// Errors raised by hooks that failed to run, as opposed to vetoing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// A hook could not complete.
    #[error("hook `{hook}` failed: {reason}")]
    Failed {
        /// Name of the failing hook.
        hook: String,
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
}

impl HookError {
    /// Helper to construct failures from string-like values.
    #[must_use]
    pub fn failed(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            hook: hook.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for hook operations.
pub type HookResult<T> = Result<T, HookError>;

/// Extension observing, and optionally vetoing, policy deploys.
#[async_trait]
pub trait DeployHook: Send + Sync {
    /// Name used when attributing decisions and failures.
    fn name(&self) -> &str;

    /// Called before the store is touched.
    async fn before_deploy(&self, _document: &PolicyDocument) -> HookResult<HookDecision> {
        Ok(HookDecision::proceed())
    }

    /// Called once a deploy has completed.
    async fn after_deploy(&self, _result: &DeployResult) -> HookResult<()> {
        Ok(())
    }
}

/// Fires the `beforeDeployPolicy` and `afterDeployPolicy` notifications.
#[async_trait]
pub trait DeployHookBus: Send + Sync {
    /// Notifies hooks that `document` is about to be deployed.
    async fn fire_before(&self, document: &PolicyDocument) -> HookResult<HookDecision>;

    /// Notifies hooks that a deploy completed with `result`.
    async fn fire_after(&self, result: &DeployResult) -> HookResult<()>;
}

/// Hook bus dispatching to registered hooks in insertion order.
#[derive(Default)]
pub struct HookRegistry {
    hooks: RwLock<Vec<Arc<dyn DeployHook>>>,
}

impl HookRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook after the ones already present.
    ///
    /// # Panics
    ///
    /// Panics if the internal hook list lock has been poisoned.
    pub fn register(&self, hook: Arc<dyn DeployHook>) {
        let mut guard = self.hooks.write().expect("hook registry poisoned");
        guard.push(hook);
    }

    /// Returns the number of registered hooks.
    ///
    /// # Panics
    ///
    /// Panics if the internal hook list lock has been poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.read().expect("hook registry poisoned").len()
    }

    /// Returns `true` when no hooks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn DeployHook>> {
        self.hooks.read().expect("hook registry poisoned").clone()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .snapshot()
            .iter()
            .map(|hook| hook.name().to_owned())
            .collect();
        f.debug_struct("HookRegistry").field("hooks", &names).finish()
    }
}

#[async_trait]
impl DeployHookBus for HookRegistry {
    async fn fire_before(&self, document: &PolicyDocument) -> HookResult<HookDecision> {
        for hook in self.snapshot() {
            let decision = hook.before_deploy(document).await?;
            if decision.is_reject() {
                debug!(hook = hook.name(), policy = document.name(), "deploy vetoed by hook");
                return Ok(decision.attributed_to(hook.name()));
            }
        }

        Ok(HookDecision::proceed())
    }

    async fn fire_after(&self, result: &DeployResult) -> HookResult<()> {
        let mut first_error = None;
        for hook in self.snapshot() {
            if let Err(err) = hook.after_deploy(result).await {
                warn!(hook = hook.name(), error = %err, "after-deploy hook failed");
                first_error.get_or_insert(err);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
