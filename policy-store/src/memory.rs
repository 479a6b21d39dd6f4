//! In-memory policy store with IAM-style retention and escaping rules.

use std::collections::HashMap;

use async_trait::async_trait;
use policy_primitives::{DeployedPolicy, PolicyArn, PolicyVersion, RawDocument, VersionId};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::traits::{ExternalPolicyStore, StoreError, StoreResult};

/// Number of versions IAM retains per policy.
const MAX_VERSIONS: usize = 5;
const DEFAULT_ACCOUNT_ID: &str = "123456789012";
const MANAGED_ACCOUNT_ID: &str = "aws";

/// Store operations, used to count calls and inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// [`ExternalPolicyStore::find_by_name`].
    FindByName,
    /// [`ExternalPolicyStore::read_version_document`].
    ReadVersionDocument,
    /// [`ExternalPolicyStore::list_versions`].
    ListVersions,
    /// [`ExternalPolicyStore::create`].
    Create,
    /// [`ExternalPolicyStore::create_version`].
    CreateVersion,
    /// [`ExternalPolicyStore::delete_version`].
    DeleteVersion,
}

impl StoreOperation {
    /// Returns `true` for operations that write to the store.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::CreateVersion | Self::DeleteVersion)
    }
}

/// A call received by the store, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    /// Lookup by name and path prefix.
    FindByName {
        /// Requested policy name.
        name: String,
        /// Requested path prefix.
        path_prefix: String,
    },
    /// Read of a version body.
    ReadVersionDocument {
        /// Target policy.
        arn: PolicyArn,
        /// Target version.
        version_id: VersionId,
    },
    /// Version listing.
    ListVersions {
        /// Target policy.
        arn: PolicyArn,
    },
    /// Policy creation.
    Create {
        /// Requested policy name.
        name: String,
        /// Requested path.
        path_prefix: String,
    },
    /// Version creation.
    CreateVersion {
        /// Target policy.
        arn: PolicyArn,
        /// Whether the new version was requested as default.
        set_as_default: bool,
    },
    /// Version deletion.
    DeleteVersion {
        /// Target policy.
        arn: PolicyArn,
        /// Target version.
        version_id: VersionId,
    },
}

impl StoreCall {
    /// Returns the operation this call invoked.
    #[must_use]
    pub const fn operation(&self) -> StoreOperation {
        match self {
            Self::FindByName { .. } => StoreOperation::FindByName,
            Self::ReadVersionDocument { .. } => StoreOperation::ReadVersionDocument,
            Self::ListVersions { .. } => StoreOperation::ListVersions,
            Self::Create { .. } => StoreOperation::Create,
            Self::CreateVersion { .. } => StoreOperation::CreateVersion,
            Self::DeleteVersion { .. } => StoreOperation::DeleteVersion,
        }
    }
}

#[derive(Debug)]
struct StoredVersion {
    id: VersionId,
    document: String,
}

#[derive(Debug)]
struct StoredPolicy {
    arn: PolicyArn,
    name: String,
    path: String,
    managed: bool,
    default_version: VersionId,
    next_version: VersionId,
    versions: Vec<StoredVersion>,
}

impl StoredPolicy {
    fn snapshot(&self) -> DeployedPolicy {
        DeployedPolicy::new(
            self.arn.clone(),
            self.name.clone(),
            self.path.clone(),
            self.default_version,
        )
    }

    fn listing(&self) -> Vec<PolicyVersion> {
        self.versions
            .iter()
            .rev()
            .map(|version| PolicyVersion::new(version.id, version.id == self.default_version))
            .collect()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    policies: Vec<StoredPolicy>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOperation, StoreError>,
}

impl StoreState {
    fn begin(&mut self, call: StoreCall) -> StoreResult<()> {
        let operation = call.operation();
        self.calls.push(call);
        match self.failures.remove(&operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn local_mut(&mut self, arn: &PolicyArn) -> StoreResult<&mut StoredPolicy> {
        self.policies
            .iter_mut()
            .find(|policy| !policy.managed && &policy.arn == arn)
            .ok_or_else(|| StoreError::not_found(format!("policy {arn}")))
    }
}

/// Policy store kept in process memory.
///
/// Behaves like IAM where it matters to deploys: at most five versions per
/// policy, documents handed back URL-escaped, versions listed newest first,
/// the default version cannot be deleted, and lookups ignore provider-managed
/// policies. Every call is journaled and any operation can be made to fail
/// once through [`InMemoryPolicyStore::fail_next`].
#[derive(Debug)]
pub struct InMemoryPolicyStore {
    account_id: String,
    state: Mutex<StoreState>,
}

impl InMemoryPolicyStore {
    /// Creates an empty store for the default account.
    #[must_use]
    pub fn new() -> Self {
        Self::with_account_id(DEFAULT_ACCOUNT_ID)
    }

    /// Creates an empty store for the given account identifier.
    #[must_use]
    pub fn with_account_id(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Seeds a locally managed policy whose versions are numbered from `v1`
    /// in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the history is empty, longer than
    /// five versions, does not have exactly one default, or the name is taken.
    pub async fn seed_policy(
        &self,
        name: &str,
        path: &str,
        history: Vec<(Value, bool)>,
    ) -> StoreResult<DeployedPolicy> {
        if history.is_empty() || history.len() > MAX_VERSIONS {
            return Err(StoreError::conflict(
                "seeded history must hold between one and five versions",
            ));
        }
        let defaults: Vec<usize> = history
            .iter()
            .enumerate()
            .filter_map(|(index, (_, is_default))| is_default.then_some(index))
            .collect();
        let [default_index] = defaults.as_slice() else {
            return Err(StoreError::conflict(
                "seeded history must have exactly one default version",
            ));
        };

        let mut state = self.state.lock().await;
        if state.policies.iter().any(|p| !p.managed && p.name == name) {
            return Err(StoreError::conflict(format!("policy {name} already exists")));
        }

        let versions: Vec<StoredVersion> = history
            .into_iter()
            .zip(1u32..)
            .map(|((body, _), number)| StoredVersion {
                id: VersionId::new(number),
                document: body.to_string(),
            })
            .collect();
        let next_version = VersionId::new(u32::try_from(versions.len()).unwrap_or(u32::MAX)).next();
        let policy = StoredPolicy {
            arn: arn_for(&self.account_id, path, name),
            name: name.to_owned(),
            path: path.to_owned(),
            managed: false,
            default_version: versions[*default_index].id,
            next_version,
            versions,
        };
        let snapshot = policy.snapshot().with_versions(policy.listing());
        state.policies.push(policy);
        Ok(snapshot)
    }

    /// Seeds a provider-managed policy, which lookups must never return.
    pub async fn insert_managed_policy(&self, name: &str, path: &str, body: &Value) {
        let mut state = self.state.lock().await;
        state.policies.push(StoredPolicy {
            arn: arn_for(MANAGED_ACCOUNT_ID, path, name),
            name: name.to_owned(),
            path: path.to_owned(),
            managed: true,
            default_version: VersionId::new(1),
            next_version: VersionId::new(2),
            versions: vec![StoredVersion {
                id: VersionId::new(1),
                document: body.to_string(),
            }],
        });
    }

    /// Makes the next call of `operation` fail with `error`.
    pub async fn fail_next(&self, operation: StoreOperation, error: StoreError) {
        self.state.lock().await.failures.insert(operation, error);
    }

    /// Returns every call received so far.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    /// Returns how many times `operation` was called.
    pub async fn call_count(&self, operation: StoreOperation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Returns how many write operations were called.
    pub async fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| call.operation().is_mutation())
            .count()
    }

    /// Returns the versions of the named local policy in ascending order
    /// without journaling a call.
    pub async fn versions_of(&self, name: &str) -> Vec<PolicyVersion> {
        let state = self.state.lock().await;
        state
            .policies
            .iter()
            .find(|policy| !policy.managed && policy.name == name)
            .map(|policy| {
                let mut listing = policy.listing();
                listing.reverse();
                listing
            })
            .unwrap_or_default()
    }
}

fn arn_for(account_id: &str, path: &str, name: &str) -> PolicyArn {
    PolicyArn::new(format!("arn:aws:iam::{account_id}:policy{path}{name}"))
}

impl Default for InMemoryPolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExternalPolicyStore for InMemoryPolicyStore {
    async fn find_by_name(
        &self,
        name: &str,
        path_prefix: &str,
    ) -> StoreResult<Option<DeployedPolicy>> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::FindByName {
            name: name.to_owned(),
            path_prefix: path_prefix.to_owned(),
        })?;

        Ok(state
            .policies
            .iter()
            .filter(|policy| !policy.managed && policy.path.starts_with(path_prefix))
            .find(|policy| policy.name == name)
            .map(StoredPolicy::snapshot))
    }

    async fn read_version_document(
        &self,
        arn: &PolicyArn,
        version_id: VersionId,
    ) -> StoreResult<RawDocument> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::ReadVersionDocument {
            arn: arn.clone(),
            version_id,
        })?;

        let policy = state.local_mut(arn)?;
        let version = policy
            .versions
            .iter()
            .find(|version| version.id == version_id)
            .ok_or_else(|| StoreError::not_found(format!("version {version_id} of {arn}")))?;
        Ok(RawDocument::new(urlencoding::encode(&version.document)))
    }

    async fn list_versions(&self, arn: &PolicyArn) -> StoreResult<Vec<PolicyVersion>> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::ListVersions { arn: arn.clone() })?;
        Ok(state.local_mut(arn)?.listing())
    }

    async fn create(
        &self,
        name: &str,
        path_prefix: &str,
        body: &Value,
        description: &str,
    ) -> StoreResult<DeployedPolicy> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::Create {
            name: name.to_owned(),
            path_prefix: path_prefix.to_owned(),
        })?;

        if state.policies.iter().any(|p| !p.managed && p.name == name) {
            return Err(StoreError::conflict(format!(
                "EntityAlreadyExists: policy {name} already exists"
            )));
        }

        let policy = StoredPolicy {
            arn: arn_for(&self.account_id, path_prefix, name),
            name: name.to_owned(),
            path: path_prefix.to_owned(),
            managed: false,
            default_version: VersionId::new(1),
            next_version: VersionId::new(2),
            versions: vec![StoredVersion {
                id: VersionId::new(1),
                document: body.to_string(),
            }],
        };
        debug!(arn = %policy.arn, description, "policy created");
        let snapshot = policy.snapshot().with_versions(policy.listing());
        state.policies.push(policy);
        Ok(snapshot)
    }

    async fn create_version(
        &self,
        arn: &PolicyArn,
        body: &Value,
        set_as_default: bool,
    ) -> StoreResult<PolicyVersion> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::CreateVersion {
            arn: arn.clone(),
            set_as_default,
        })?;

        let policy = state.local_mut(arn)?;
        if policy.versions.len() >= MAX_VERSIONS {
            return Err(StoreError::conflict(format!(
                "LimitExceeded: {arn} already has {MAX_VERSIONS} versions"
            )));
        }

        let id = policy.next_version;
        policy.next_version = id.next();
        policy.versions.push(StoredVersion {
            id,
            document: body.to_string(),
        });
        if set_as_default {
            policy.default_version = id;
        }
        debug!(%arn, version = %id, set_as_default, "policy version created");
        Ok(PolicyVersion::new(id, set_as_default))
    }

    async fn delete_version(&self, arn: &PolicyArn, version_id: VersionId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.begin(StoreCall::DeleteVersion {
            arn: arn.clone(),
            version_id,
        })?;

        let policy = state.local_mut(arn)?;
        if policy.default_version == version_id {
            return Err(StoreError::conflict(format!(
                "DeleteConflict: {version_id} is the default version of {arn}"
            )));
        }
        let before = policy.versions.len();
        policy.versions.retain(|version| version.id != version_id);
        if policy.versions.len() == before {
            return Err(StoreError::not_found(format!("version {version_id} of {arn}")));
        }
        debug!(%arn, version = %version_id, "policy version deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(n: u32) -> Value {
        json!({"Version": "2012-10-17", "Statement": [{"Sid": format!("s{n}"), "Effect": "Allow", "Action": "s3:GetObject", "Resource": "*"}]})
    }

    #[tokio::test]
    async fn create_then_find_by_prefix() {
        let store = InMemoryPolicyStore::new();
        let created = store
            .create("read-only", "/team/", &body(1), "test")
            .await
            .unwrap();
        assert_eq!(
            created.arn().as_str(),
            "arn:aws:iam::123456789012:policy/team/read-only"
        );
        assert_eq!(created.default_version_id(), VersionId::new(1));

        assert!(store.find_by_name("read-only", "/").await.unwrap().is_some());
        assert!(store.find_by_name("read-only", "/team/").await.unwrap().is_some());
        assert!(store.find_by_name("read-only", "/other/").await.unwrap().is_none());
        assert!(store.find_by_name("missing", "/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn managed_policies_are_invisible_to_lookup() {
        let store = InMemoryPolicyStore::new();
        store.insert_managed_policy("ReadOnlyAccess", "/", &body(1)).await;
        assert!(store.find_by_name("ReadOnlyAccess", "/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn documents_are_returned_escaped() {
        let store = InMemoryPolicyStore::new();
        let created = store.create("p", "/", &body(1), "test").await.unwrap();
        let raw = store
            .read_version_document(created.arn(), VersionId::new(1))
            .await
            .unwrap();
        assert!(raw.as_str().starts_with("%7B"));
        assert_eq!(raw.normalize().unwrap(), body(1));
    }

    #[tokio::test]
    async fn enforces_version_cap_and_default_protection() {
        let store = InMemoryPolicyStore::new();
        let seeded = store
            .seed_policy(
                "p",
                "/",
                (1..=5).map(|n| (body(n), n == 5)).collect(),
            )
            .await
            .unwrap();
        let arn = seeded.arn().clone();

        let err = store.create_version(&arn, &body(6), true).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let err = store.delete_version(&arn, VersionId::new(5)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        store.delete_version(&arn, VersionId::new(1)).await.unwrap();
        let err = store.delete_version(&arn, VersionId::new(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let created = store.create_version(&arn, &body(6), true).await.unwrap();
        assert_eq!(created.version_id(), VersionId::new(6));

        let listing = store.list_versions(&arn).await.unwrap();
        let ids: Vec<u32> = listing.iter().map(|v| v.version_id().number()).collect();
        assert_eq!(ids, vec![6, 5, 4, 3, 2]);
        assert!(listing[0].is_default());
        assert_eq!(listing.iter().filter(|v| v.is_default()).count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_fire_once_and_calls_are_journaled() {
        let store = InMemoryPolicyStore::new();
        store
            .fail_next(StoreOperation::FindByName, StoreError::unavailable("timeout"))
            .await;

        let err = store.find_by_name("p", "/").await.unwrap_err();
        assert_eq!(err, StoreError::unavailable("timeout"));
        assert!(store.find_by_name("p", "/").await.is_ok());

        assert_eq!(store.call_count(StoreOperation::FindByName).await, 2);
        assert_eq!(store.mutation_count().await, 0);
    }

    #[tokio::test]
    async fn seeding_rejects_inconsistent_histories() {
        let store = InMemoryPolicyStore::new();
        let err = store
            .seed_policy("p", "/", vec![(body(1), true), (body(2), true)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(store.seed_policy("p", "/", Vec::new()).await.is_err());
    }
}
