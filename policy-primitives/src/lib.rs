//! Core shared types for deploying versioned access-control policies.

#![warn(missing_docs, clippy::pedantic)]

mod deployed;
mod document;
mod error;
mod ids;
mod outcome;

/// Store-side view of an existing policy and its version history.
pub use deployed::{DeployedPolicy, PolicyVersion};
/// Desired policy document and the store's raw rendering of one.
pub use document::{DEFAULT_PATH_PREFIX, PolicyDocument, RawDocument};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifiers for deploy calls, policies, and policy versions.
pub use ids::{DeployId, PolicyArn, VersionId};
/// Result of a single deploy call.
pub use outcome::{DeployAction, DeployResult};
