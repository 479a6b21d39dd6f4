//! Deploy orchestration: lookup, compare, rotate, publish.

use std::future::Future;
use std::sync::Arc;

use policy_config::EngineConfig;
use policy_hooks::{DeployHookBus, HookError, HookRegistry};
use policy_primitives::{
    DeployAction, DeployId, DeployResult, DeployedPolicy, PolicyDocument, PolicyVersion,
};
use policy_store::ExternalPolicyStore;
use tracing::{debug, warn};

use crate::cancel::CancelSignal;
use crate::error::{DeployError, EngineResult};
use crate::events::{DeployEvent, DeployEventKind, DeployObserver, NoopObserver};
use crate::rotation::VersionHistoryManager;

/// Builder for [`PolicyDeploymentEngine`] instances.
pub struct EngineBuilder {
    store: Arc<dyn ExternalPolicyStore>,
    hooks: Arc<dyn DeployHookBus>,
    observer: Arc<dyn DeployObserver>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Starts a builder around the given store, with no hooks, a silent
    /// observer, and the default configuration.
    #[must_use]
    pub fn new(store: Arc<dyn ExternalPolicyStore>) -> Self {
        Self {
            store,
            hooks: Arc::new(HookRegistry::new()),
            observer: Arc::new(NoopObserver),
            config: EngineConfig::default(),
        }
    }

    /// Installs the hook bus fired around every deploy.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn DeployHookBus>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Installs the observer receiving deploy events.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DeployObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidConfig`] when the configuration does not
    /// validate.
    pub fn build(self) -> EngineResult<PolicyDeploymentEngine> {
        self.config.validate()?;
        Ok(PolicyDeploymentEngine {
            store: self.store,
            hooks: self.hooks,
            observer: self.observer,
            history: VersionHistoryManager::new(self.config.max_versions()),
            config: self.config,
        })
    }
}

/// Publishes policy documents idempotently under a bounded version history.
///
/// The engine keeps no state between calls; the store is authoritative.
pub struct PolicyDeploymentEngine {
    store: Arc<dyn ExternalPolicyStore>,
    hooks: Arc<dyn DeployHookBus>,
    observer: Arc<dyn DeployObserver>,
    history: VersionHistoryManager,
    config: EngineConfig,
}

impl std::fmt::Debug for PolicyDeploymentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyDeploymentEngine")
            .field("history", &self.history)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PolicyDeploymentEngine {
    /// Creates a builder for an engine deploying to `store`.
    #[must_use]
    pub fn builder(store: Arc<dyn ExternalPolicyStore>) -> EngineBuilder {
        EngineBuilder::new(store)
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the rotation policy in use.
    #[must_use]
    pub const fn history(&self) -> VersionHistoryManager {
        self.history
    }

    /// Deploys `document`, creating or updating the policy only when needed.
    ///
    /// Must be called from within a `tokio` runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::HookRejected`] when a before hook vetoes the
    /// deploy, [`DeployError::StoreUnavailable`] when the store cannot be
    /// reached, and [`DeployError::StoreConflict`] when the store contradicts
    /// its own invariants or refuses a write.
    pub async fn deploy(&self, document: &PolicyDocument) -> EngineResult<DeployResult> {
        self.deploy_with_cancel(document, &CancelSignal::new()).await
    }

    /// Deploys `document`, abandoning the call if `cancel` is raised before the
    /// first store mutation.
    ///
    /// Once a mutation has been issued it runs on its own task and completes
    /// even if `cancel` is raised or this future is dropped, so the store is
    /// never left with a deleted version and no replacement.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Cancelled`] when cancellation was observed before
    /// any mutation, plus every error of [`deploy`](Self::deploy).
    pub async fn deploy_with_cancel(
        &self,
        document: &PolicyDocument,
        cancel: &CancelSignal,
    ) -> EngineResult<DeployResult> {
        let run = DeployRun {
            deploy_id: DeployId::random(),
            document,
            cancel,
            observer: self.observer.as_ref(),
        };
        run.emit(DeployEventKind::Started);

        match self.execute(&run).await {
            Ok(result) => {
                run.emit(DeployEventKind::Completed {
                    action: result.action(),
                });
                Ok(result)
            }
            Err(err) => {
                run.emit(DeployEventKind::Failed {
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn execute(&self, run: &DeployRun<'_>) -> EngineResult<DeployResult> {
        let document = run.document;
        run.checkpoint()?;

        let decision = self
            .hooks
            .fire_before(document)
            .await
            .map_err(|HookError::Failed { hook, reason }| DeployError::HookRejected {
                hook,
                reason: format!("hook failed: {reason}"),
            })?;
        if decision.is_reject() {
            let hook = decision.hook().unwrap_or("unnamed").to_owned();
            let reason = decision.reason().unwrap_or("no reason given").to_owned();
            run.emit(DeployEventKind::HookRejected {
                hook: hook.clone(),
                reason: reason.clone(),
            });
            return Err(DeployError::HookRejected { hook, reason });
        }
        run.checkpoint()?;

        let current = self
            .store
            .find_by_name(document.name(), document.path_prefix())
            .await
            .map_err(|err| DeployError::from_store(run.policy(), None, err))?;
        run.emit(DeployEventKind::LookupCompleted {
            found: current.is_some(),
        });
        run.checkpoint()?;

        let result = match current {
            None => self.create(run).await?,
            Some(current) => self.update_if_needed(run, current).await?,
        };

        if let Err(err) = self.hooks.fire_after(&result).await {
            warn!(deploy_id = %run.deploy_id, policy = run.policy(), error = %err, "after-deploy hook failed");
            run.emit(DeployEventKind::AfterHookFailed {
                reason: err.to_string(),
            });
        }

        Ok(result)
    }

    async fn create(&self, run: &DeployRun<'_>) -> EngineResult<DeployResult> {
        run.emit(DeployEventKind::Creating);

        let store = Arc::clone(&self.store);
        let name = run.policy().to_owned();
        let path_prefix = run.document.path_prefix().to_owned();
        let body = run.document.body().clone();
        let description = self.config.description().to_owned();
        let policy = spawn_mutation(run.policy(), async move {
            store
                .create(&name, &path_prefix, &body, &description)
                .await
                .map_err(|err| DeployError::from_store(&name, None, err))
        })
        .await?;

        run.emit(DeployEventKind::Created {
            arn: policy.arn().clone(),
        });
        Ok(DeployResult::new(policy, DeployAction::Created))
    }

    async fn update_if_needed(
        &self,
        run: &DeployRun<'_>,
        current: DeployedPolicy,
    ) -> EngineResult<DeployResult> {
        let default_id = current.default_version_id();
        let stored = self
            .store
            .read_version_document(current.arn(), default_id)
            .await
            .map_err(|err| DeployError::from_store(run.policy(), Some(default_id), err))?;
        run.checkpoint()?;

        if run.document.matches(&stored) {
            let versions = self
                .store
                .list_versions(current.arn())
                .await
                .map_err(|err| DeployError::from_store(run.policy(), None, err))?;
            run.emit(DeployEventKind::AlreadyUpToDate {
                version: default_id,
            });

            let mut listed: Vec<PolicyVersion> = versions
                .into_iter()
                .map(|version| {
                    if version.version_id() == default_id {
                        version.with_document(stored.clone())
                    } else {
                        version
                    }
                })
                .collect();
            listed.sort_by_key(PolicyVersion::version_id);
            return Ok(DeployResult::new(
                current.with_versions(listed),
                DeployAction::NoOpAlreadyUpToDate,
            ));
        }
        run.emit(DeployEventKind::UpdateRequired {
            current_default: default_id,
        });

        let versions = self
            .store
            .list_versions(current.arn())
            .await
            .map_err(|err| DeployError::from_store(run.policy(), None, err))?;
        run.checkpoint()?;

        let slot = self
            .history
            .clear_slot(&versions)
            .map_err(|err| DeployError::StoreConflict {
                policy: run.policy().to_owned(),
                version: None,
                reason: err.to_string(),
            })?;
        let evicted = slot.evictions().to_vec();
        for &version in &evicted {
            run.emit(DeployEventKind::EvictingVersion { version });
        }

        let store = Arc::clone(&self.store);
        let name = run.policy().to_owned();
        let arn = current.arn().clone();
        let body = run.document.body().clone();
        let evictions = evicted.clone();
        let created = spawn_mutation(run.policy(), async move {
            for version in evictions {
                store
                    .delete_version(&arn, version)
                    .await
                    .map_err(|err| DeployError::from_store(&name, Some(version), err))?;
            }
            store
                .create_version(&arn, &body, true)
                .await
                .map_err(|err| DeployError::from_store(&name, None, err))
        })
        .await?;
        run.emit(DeployEventKind::VersionCreated {
            version: created.version_id(),
        });

        let mut retained: Vec<PolicyVersion> = versions
            .into_iter()
            .filter(|version| !evicted.contains(&version.version_id()))
            .map(|version| version.with_default(false))
            .chain(std::iter::once(created.clone().with_default(true)))
            .collect();
        retained.sort_by_key(PolicyVersion::version_id);

        let policy = DeployedPolicy::new(
            current.arn().clone(),
            current.name(),
            current.path(),
            created.version_id(),
        )
        .with_versions(retained);
        Ok(DeployResult::new(policy, DeployAction::UpdatedWithNewVersion))
    }
}

/// Per-call context threaded through the deploy steps.
struct DeployRun<'a> {
    deploy_id: DeployId,
    document: &'a PolicyDocument,
    cancel: &'a CancelSignal,
    observer: &'a dyn DeployObserver,
}

impl DeployRun<'_> {
    fn policy(&self) -> &str {
        self.document.name()
    }

    fn emit(&self, kind: DeployEventKind) {
        debug!(deploy_id = %self.deploy_id, policy = self.policy(), event = ?kind, "policy deploy transition");
        self.observer
            .on_event(&DeployEvent::new(self.deploy_id, self.policy(), kind));
    }

    fn checkpoint(&self) -> EngineResult<()> {
        if self.cancel.is_cancelled() {
            return Err(DeployError::Cancelled {
                policy: self.policy().to_owned(),
            });
        }
        Ok(())
    }
}

/// Runs a store mutation on its own task so it survives cancellation of the
/// calling future.
async fn spawn_mutation<T, F>(policy: &str, mutation: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(mutation)
        .await
        .map_err(|err| DeployError::MutationInterrupted {
            policy: policy.to_owned(),
            reason: err.to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_primitives::VersionId;
    use policy_store::{InMemoryPolicyStore, StoreOperation};
    use serde_json::json;

    use crate::events::CollectingObserver;

    fn document(statement: &str) -> PolicyDocument {
        PolicyDocument::new(
            "read-only",
            json!({"Version": "2012-10-17", "Statement": [{"Sid": statement, "Effect": "Allow", "Action": "s3:GetObject", "Resource": "*"}]}),
        )
        .unwrap()
    }

    #[test]
    fn builder_rejects_invalid_config() {
        let err = PolicyDeploymentEngine::builder(Arc::new(InMemoryPolicyStore::new()))
            .with_config(EngineConfig::new(9, "too many"))
            .build()
            .expect_err("cap above five must fail");
        assert!(matches!(err, DeployError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn emits_transitions_for_a_create() {
        let observer = CollectingObserver::new();
        let engine = PolicyDeploymentEngine::builder(Arc::new(InMemoryPolicyStore::new()))
            .with_observer(observer.clone())
            .build()
            .unwrap();

        engine.deploy(&document("a")).await.unwrap();

        let kinds: Vec<DeployEventKind> =
            observer.drain().into_iter().map(|e| e.kind().clone()).collect();
        assert_eq!(kinds[0], DeployEventKind::Started);
        assert_eq!(kinds[1], DeployEventKind::LookupCompleted { found: false });
        assert_eq!(kinds[2], DeployEventKind::Creating);
        assert!(matches!(kinds[3], DeployEventKind::Created { .. }));
        assert_eq!(
            kinds[4],
            DeployEventKind::Completed {
                action: DeployAction::Created
            }
        );
    }

    #[tokio::test]
    async fn lower_cap_rotates_earlier() {
        let store = Arc::new(InMemoryPolicyStore::new());
        let engine = PolicyDeploymentEngine::builder(store.clone())
            .with_config(EngineConfig::new(3, "capped"))
            .build()
            .unwrap();

        for statement in ["a", "b", "c", "d"] {
            engine.deploy(&document(statement)).await.unwrap();
        }

        let ids: Vec<u32> = store
            .versions_of("read-only")
            .await
            .iter()
            .map(|v| v.version_id().number())
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(store.call_count(StoreOperation::DeleteVersion).await, 1);
    }

    #[tokio::test]
    async fn update_result_reflects_post_deploy_history() {
        let store = Arc::new(InMemoryPolicyStore::new());
        let engine = PolicyDeploymentEngine::builder(store.clone()).build().unwrap();

        engine.deploy(&document("a")).await.unwrap();
        let result = engine.deploy(&document("b")).await.unwrap();

        assert_eq!(result.action(), DeployAction::UpdatedWithNewVersion);
        let policy = result.policy();
        assert_eq!(policy.default_version_id(), VersionId::new(2));
        let listed: Vec<(u32, bool)> = policy
            .versions()
            .iter()
            .map(|v| (v.version_id().number(), v.is_default()))
            .collect();
        assert_eq!(listed, vec![(1, false), (2, true)]);
    }
}
