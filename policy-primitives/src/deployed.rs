//! Store-side snapshot of a policy and its versions.

use serde::{Deserialize, Serialize};

use crate::document::RawDocument;
use crate::ids::{PolicyArn, VersionId};

/// One retained version of a policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVersion {
    version_id: VersionId,
    is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    document: Option<RawDocument>,
}

impl PolicyVersion {
    /// Creates a version entry without its document body.
    #[must_use]
    pub const fn new(version_id: VersionId, is_default: bool) -> Self {
        Self {
            version_id,
            is_default,
            document: None,
        }
    }

    /// Attaches the stored document body.
    #[must_use]
    pub fn with_document(mut self, document: RawDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Returns a copy of this entry with the default flag replaced.
    #[must_use]
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Returns the version identifier.
    #[must_use]
    pub const fn version_id(&self) -> VersionId {
        self.version_id
    }

    /// Returns `true` when this version is the one in effect.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the stored document, when the store included it.
    #[must_use]
    pub fn document(&self) -> Option<&RawDocument> {
        self.document.as_ref()
    }
}

/// Snapshot of a policy as the store reported it during one deploy call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedPolicy {
    arn: PolicyArn,
    name: String,
    path: String,
    default_version_id: VersionId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    versions: Vec<PolicyVersion>,
}

impl DeployedPolicy {
    /// Creates a snapshot with no version listing attached.
    #[must_use]
    pub fn new(
        arn: PolicyArn,
        name: impl Into<String>,
        path: impl Into<String>,
        default_version_id: VersionId,
    ) -> Self {
        Self {
            arn,
            name: name.into(),
            path: path.into(),
            default_version_id,
            versions: Vec::new(),
        }
    }

    /// Attaches a version listing.
    #[must_use]
    pub fn with_versions(mut self, versions: Vec<PolicyVersion>) -> Self {
        self.versions = versions;
        self
    }

    /// Returns the store-assigned resource name.
    #[must_use]
    pub fn arn(&self) -> &PolicyArn {
        &self.arn
    }

    /// Returns the policy name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path the policy lives under.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the identifier of the version currently in effect.
    #[must_use]
    pub const fn default_version_id(&self) -> VersionId {
        self.default_version_id
    }

    /// Returns the version listing, which may be empty when the store
    /// reported the policy without its history.
    #[must_use]
    pub fn versions(&self) -> &[PolicyVersion] {
        &self.versions
    }

    /// Returns the listed entry for the default version, if present.
    #[must_use]
    pub fn default_version(&self) -> Option<&PolicyVersion> {
        self.versions
            .iter()
            .find(|version| version.version_id() == self.default_version_id)
    }
}
