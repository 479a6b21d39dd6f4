//! Policy store trait and errors.

use async_trait::async_trait;
use policy_primitives::{DeployedPolicy, PolicyArn, PolicyVersion, RawDocument, VersionId};
use serde_json::Value;
use thiserror::Error;

/// Errors reported by policy store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Transport or authorisation failure talking to the store.
    #[error("policy store unavailable: {reason}")]
    Unavailable {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
    /// The addressed policy or version does not exist.
    #[error("{resource} not found")]
    NotFound {
        /// Description of the missing resource.
        resource: String,
    },
    /// The store refused the request because of its own invariants.
    #[error("policy store rejected request: {reason}")]
    Conflict {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
}

impl StoreError {
    /// Helper to construct availability errors from string-like values.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Helper to construct not-found errors from string-like values.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Helper to construct conflict errors from string-like values.
    #[must_use]
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Remote service holding policies and their bounded version history.
///
/// Every operation may suspend on network I/O and may fail independently.
/// Implementations are expected to scope lookups to locally managed policies.
#[async_trait]
pub trait ExternalPolicyStore: Send + Sync {
    /// Finds the locally managed policy called `name` under `path_prefix`.
    async fn find_by_name(
        &self,
        name: &str,
        path_prefix: &str,
    ) -> StoreResult<Option<DeployedPolicy>>;

    /// Reads the document body of one version.
    async fn read_version_document(
        &self,
        arn: &PolicyArn,
        version_id: VersionId,
    ) -> StoreResult<RawDocument>;

    /// Lists the retained versions of a policy.
    async fn list_versions(&self, arn: &PolicyArn) -> StoreResult<Vec<PolicyVersion>>;

    /// Creates a new policy whose first version becomes the default.
    async fn create(
        &self,
        name: &str,
        path_prefix: &str,
        body: &Value,
        description: &str,
    ) -> StoreResult<DeployedPolicy>;

    /// Creates a new version, optionally making it the default.
    async fn create_version(
        &self,
        arn: &PolicyArn,
        body: &Value,
        set_as_default: bool,
    ) -> StoreResult<PolicyVersion>;

    /// Deletes a non-default version.
    async fn delete_version(&self, arn: &PolicyArn, version_id: VersionId) -> StoreResult<()>;
}
