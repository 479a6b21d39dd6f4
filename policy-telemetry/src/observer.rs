//! Deploy event rendering through `tracing`.

use policy_deploy::{DeployEvent, DeployEventKind, DeployObserver};
use tracing::{debug, info, warn};

/// Observer logging each deploy event as a structured record.
///
/// Outcomes are logged at `info`, intermediate steps at `debug`, and failures
/// at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DeployObserver for TracingObserver {
    fn on_event(&self, event: &DeployEvent) {
        let deploy_id = event.deploy_id();
        let policy = event.policy();

        match event.kind() {
            DeployEventKind::Started => debug!(%deploy_id, policy, "deploying policy"),
            DeployEventKind::HookRejected { hook, reason } => {
                warn!(%deploy_id, policy, %hook, %reason, "policy deploy rejected by hook");
            }
            DeployEventKind::LookupCompleted { found: true } => {
                info!(%deploy_id, policy, "policy already exists");
            }
            DeployEventKind::LookupCompleted { found: false } => {
                info!(%deploy_id, policy, "policy does not exist");
            }
            DeployEventKind::Creating => debug!(%deploy_id, policy, "creating policy"),
            DeployEventKind::Created { arn } => {
                info!(%deploy_id, policy, %arn, "policy created");
            }
            DeployEventKind::AlreadyUpToDate { version } => {
                info!(%deploy_id, policy, %version, "policy is already up to date");
            }
            DeployEventKind::UpdateRequired { current_default } => {
                info!(%deploy_id, policy, %current_default, "policy must be updated");
            }
            DeployEventKind::EvictingVersion { version } => {
                info!(%deploy_id, policy, %version, "version limit reached, deleting oldest version");
            }
            DeployEventKind::VersionCreated { version } => {
                info!(%deploy_id, policy, %version, "new default version created");
            }
            DeployEventKind::AfterHookFailed { reason } => {
                warn!(%deploy_id, policy, %reason, "after-deploy hook failed");
            }
            DeployEventKind::Completed { action } => {
                info!(%deploy_id, policy, %action, "policy deployed");
            }
            DeployEventKind::Failed { error } => {
                warn!(%deploy_id, policy, %error, "policy deploy failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policy_primitives::{DeployAction, DeployId, VersionId};

    #[test]
    fn renders_every_event_kind_without_a_subscriber() {
        let observer = TracingObserver;
        let id = DeployId::random();
        for kind in [
            DeployEventKind::Started,
            DeployEventKind::LookupCompleted { found: true },
            DeployEventKind::EvictingVersion {
                version: VersionId::new(1),
            },
            DeployEventKind::Completed {
                action: DeployAction::UpdatedWithNewVersion,
            },
            DeployEventKind::Failed {
                error: "boom".into(),
            },
        ] {
            observer.on_event(&DeployEvent::new(id, "read-only", kind));
        }
    }
}
