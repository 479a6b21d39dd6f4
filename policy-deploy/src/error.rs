//! Errors surfaced by the deployment engine.

use policy_config::ConfigError;
use policy_primitives::VersionId;
use policy_store::StoreError;
use thiserror::Error;

/// Reasons a deploy call failed. None of them are retried by the engine.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Transport or authorisation failure talking to the store.
    #[error("policy store unavailable while deploying `{policy}`: {source}")]
    StoreUnavailable {
        /// Name of the policy being deployed.
        policy: String,
        /// Error reported by the store.
        #[source]
        source: StoreError,
    },
    /// The store violated one of its invariants or refused a request.
    #[error("policy store conflict while deploying `{policy}`: {reason}")]
    StoreConflict {
        /// Name of the policy being deployed.
        policy: String,
        /// Version involved in the conflict, when one was.
        version: Option<VersionId>,
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
    /// A before-deploy hook vetoed the deploy or failed to run.
    #[error("deploy rejected by hook `{hook}`: {reason}")]
    HookRejected {
        /// Name of the rejecting hook.
        hook: String,
        /// Reason supplied by the hook.
        reason: String,
    },
    /// The caller cancelled the deploy before any store mutation was issued.
    #[error("deploy of `{policy}` cancelled before any store mutation")]
    Cancelled {
        /// Name of the policy being deployed.
        policy: String,
    },
    /// The engine was built with an invalid configuration.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// The task running the store mutation panicked or was torn down.
    #[error("store mutation for `{policy}` did not complete: {reason}")]
    MutationInterrupted {
        /// Name of the policy being deployed.
        policy: String,
        /// Description of the task failure.
        reason: String,
    },
}

impl DeployError {
    /// Classifies a store error raised while deploying `policy`.
    ///
    /// A missing resource mid-deploy, including a version deleted by another
    /// actor just before eviction, is a conflict: the store changed under us.
    #[must_use]
    pub fn from_store(policy: &str, version: Option<VersionId>, error: StoreError) -> Self {
        match error {
            StoreError::Unavailable { .. } => Self::StoreUnavailable {
                policy: policy.to_owned(),
                source: error,
            },
            StoreError::NotFound { resource } => Self::StoreConflict {
                policy: policy.to_owned(),
                version,
                reason: format!("{resource} disappeared during deploy"),
            },
            StoreError::Conflict { reason } => Self::StoreConflict {
                policy: policy.to_owned(),
                version,
                reason,
            },
        }
    }

    /// Returns the version involved in a store conflict.
    #[must_use]
    pub fn conflicting_version(&self) -> Option<VersionId> {
        match self {
            Self::StoreConflict { version, .. } => *version,
            _ => None,
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_classified() {
        let err = DeployError::from_store("p", None, StoreError::unavailable("timeout"));
        assert!(matches!(err, DeployError::StoreUnavailable { .. }));
        assert!(err.to_string().contains("timeout"));

        let err = DeployError::from_store(
            "p",
            Some(VersionId::new(1)),
            StoreError::not_found("version v1"),
        );
        assert!(matches!(err, DeployError::StoreConflict { .. }));
        assert_eq!(err.conflicting_version(), Some(VersionId::new(1)));

        let err = DeployError::from_store("p", None, StoreError::conflict("LimitExceeded"));
        assert!(err.to_string().contains("LimitExceeded"));
        assert_eq!(err.conflicting_version(), None);
    }
}
