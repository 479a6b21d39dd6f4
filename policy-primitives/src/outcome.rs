//! Deploy outcomes handed to callers and after hooks.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::deployed::DeployedPolicy;

/// What a deploy call did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployAction {
    /// No policy existed; a new one was created.
    Created,
    /// The policy existed with a different document; a new default version was created.
    UpdatedWithNewVersion,
    /// The default version already carried the desired document; nothing was written.
    NoOpAlreadyUpToDate,
}

impl DeployAction {
    /// Returns `true` when the deploy wrote to the store.
    #[must_use]
    pub const fn mutated(self) -> bool {
        !matches!(self, Self::NoOpAlreadyUpToDate)
    }
}

impl Display for DeployAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::UpdatedWithNewVersion => "updated with new version",
            Self::NoOpAlreadyUpToDate => "already up to date",
        };
        f.write_str(label)
    }
}

/// Policy state after a deploy together with the action taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    policy: DeployedPolicy,
    action: DeployAction,
}

impl DeployResult {
    /// Creates a result for the given policy snapshot and action.
    #[must_use]
    pub const fn new(policy: DeployedPolicy, action: DeployAction) -> Self {
        Self { policy, action }
    }

    /// Returns the deployed policy snapshot.
    #[must_use]
    pub fn policy(&self) -> &DeployedPolicy {
        &self.policy
    }

    /// Returns the action taken.
    #[must_use]
    pub const fn action(&self) -> DeployAction {
        self.action
    }

    /// Consumes the result, returning the policy snapshot.
    #[must_use]
    pub fn into_policy(self) -> DeployedPolicy {
        self.policy
    }
}
