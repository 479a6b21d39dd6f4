//! State-transition events emitted while a deploy runs.
//!
//! The engine itself prints nothing; presentation layers implement
//! [`DeployObserver`] to render or record these events.

use std::sync::{Arc, Mutex};

use policy_primitives::{DeployAction, DeployId, PolicyArn, VersionId};
use serde::Serialize;

/// What happened at one step of a deploy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeployEventKind {
    /// The deploy call began.
    Started,
    /// A before hook vetoed the deploy.
    HookRejected {
        /// Name of the rejecting hook.
        hook: String,
        /// Reason it gave.
        reason: String,
    },
    /// The store lookup finished.
    LookupCompleted {
        /// Whether a matching policy exists.
        found: bool,
    },
    /// A new policy is about to be created.
    Creating,
    /// The policy was created.
    Created {
        /// Resource name assigned by the store.
        arn: PolicyArn,
    },
    /// The default version already carries the desired document.
    AlreadyUpToDate {
        /// The default version that was compared.
        version: VersionId,
    },
    /// The default version differs and a new version is needed.
    UpdateRequired {
        /// The default version that was compared.
        current_default: VersionId,
    },
    /// A version is about to be deleted to make room.
    EvictingVersion {
        /// The version being deleted.
        version: VersionId,
    },
    /// A new default version was created.
    VersionCreated {
        /// The new version.
        version: VersionId,
    },
    /// An after hook failed; the deploy itself stands.
    AfterHookFailed {
        /// Description of the failure.
        reason: String,
    },
    /// The deploy finished successfully.
    Completed {
        /// What the deploy did.
        action: DeployAction,
    },
    /// The deploy failed.
    Failed {
        /// Rendered error.
        error: String,
    },
}

/// One event, tagged with the deploy it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployEvent {
    deploy_id: DeployId,
    policy: String,
    #[serde(flatten)]
    kind: DeployEventKind,
}

impl DeployEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(deploy_id: DeployId, policy: impl Into<String>, kind: DeployEventKind) -> Self {
        Self {
            deploy_id,
            policy: policy.into(),
            kind,
        }
    }

    /// Returns the deploy correlation identifier.
    #[must_use]
    pub const fn deploy_id(&self) -> DeployId {
        self.deploy_id
    }

    /// Returns the name of the policy being deployed.
    #[must_use]
    pub fn policy(&self) -> &str {
        &self.policy
    }

    /// Returns what happened.
    #[must_use]
    pub fn kind(&self) -> &DeployEventKind {
        &self.kind
    }
}

/// Receives deploy events as they happen.
pub trait DeployObserver: Send + Sync {
    /// Handles one event. Must not block.
    fn on_event(&self, event: &DeployEvent);
}

/// Observer discarding every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl DeployObserver for NoopObserver {
    fn on_event(&self, _event: &DeployEvent) {}
}

/// Observer that keeps events in memory for later inspection.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<DeployEvent>>,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns and clears the collected events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn drain(&self) -> Vec<DeployEvent> {
        let mut lock = self.events.lock().expect("collecting observer poisoned");
        lock.drain(..).collect()
    }
}

impl DeployObserver for CollectingObserver {
    fn on_event(&self, event: &DeployEvent) {
        self.events
            .lock()
            .expect("collecting observer poisoned")
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_observer_drains_in_order() {
        let observer = CollectingObserver::new();
        let id = DeployId::random();
        observer.on_event(&DeployEvent::new(id, "p", DeployEventKind::Started));
        observer.on_event(&DeployEvent::new(
            id,
            "p",
            DeployEventKind::LookupCompleted { found: false },
        ));

        let events = observer.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), &DeployEventKind::Started);
        assert_eq!(events[1].deploy_id(), id);
        assert!(observer.drain().is_empty());
    }

    #[test]
    fn events_serialize_flat() {
        let event = DeployEvent::new(
            DeployId::random(),
            "read-only",
            DeployEventKind::EvictingVersion {
                version: VersionId::new(1),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "evicting_version");
        assert_eq!(json["version"], "v1");
        assert_eq!(json["policy"], "read-only");
    }
}
