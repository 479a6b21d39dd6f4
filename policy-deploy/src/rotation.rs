//! Version history rotation under the store's retention cap.

use policy_primitives::{PolicyVersion, VersionId};
use thiserror::Error;

/// Versions the policy store retains per policy.
pub const DEFAULT_MAX_VERSIONS: usize = 5;

/// What must happen before a new version can be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAction {
    /// There is room for another version.
    ProceedDirectly,
    /// The given version must be deleted first.
    EvictThenProceed(VersionId),
    /// The history is longer than the cap; these versions must be deleted
    /// first, in ascending order.
    EvictManyThenProceed(Vec<VersionId>),
}

impl SlotAction {
    /// Returns the versions to delete, oldest first.
    #[must_use]
    pub fn evictions(&self) -> &[VersionId] {
        match self {
            Self::ProceedDirectly => &[],
            Self::EvictThenProceed(version) => std::slice::from_ref(version),
            Self::EvictManyThenProceed(versions) => versions,
        }
    }
}

/// Errors raised when the listed history cannot be rotated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RotationError {
    /// Every listed version claims to be the default.
    #[error("all {count} listed versions are marked default; none can be evicted")]
    NoEvictableVersion {
        /// Number of versions listed.
        count: usize,
    },
}

/// Decides whether a version has to be evicted, and which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionHistoryManager {
    max_versions: usize,
}

impl VersionHistoryManager {
    /// Creates a manager for the given retention cap.
    #[must_use]
    pub const fn new(max_versions: usize) -> Self {
        Self { max_versions }
    }

    /// Returns the retention cap.
    #[must_use]
    pub const fn max_versions(self) -> usize {
        self.max_versions
    }

    /// Clears a slot for a new version in `versions`.
    ///
    /// Below the cap nothing has to go. At the cap the non-default version with
    /// the lowest identifier is chosen; identifiers are assigned in creation
    /// order, so that is the oldest one. Listing order is irrelevant.
    ///
    /// When the history already exceeds the cap, enough of the oldest
    /// non-default versions are chosen to leave `max_versions - 1` behind. If
    /// fewer non-default versions exist than that, all of them are chosen.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::NoEvictableVersion`] when every version is
    /// marked default.
    pub fn clear_slot(self, versions: &[PolicyVersion]) -> Result<SlotAction, RotationError> {
        if versions.len() < self.max_versions {
            return Ok(SlotAction::ProceedDirectly);
        }

        let mut candidates: Vec<VersionId> = versions
            .iter()
            .filter(|version| !version.is_default())
            .map(PolicyVersion::version_id)
            .collect();
        if candidates.is_empty() {
            return Err(RotationError::NoEvictableVersion {
                count: versions.len(),
            });
        }

        candidates.sort_unstable();
        candidates.truncate(versions.len() + 1 - self.max_versions);
        if let [single] = candidates.as_slice() {
            return Ok(SlotAction::EvictThenProceed(*single));
        }
        Ok(SlotAction::EvictManyThenProceed(candidates))
    }
}

impl Default for VersionHistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VERSIONS)
    }
}
