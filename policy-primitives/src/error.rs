//! Shared error definitions for policy primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the policy deployer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing policy primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided deploy identifier could not be parsed.
    #[error("invalid deploy id: {source}")]
    InvalidDeployId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Policy name failed validation.
    #[error("invalid policy name `{name}`: {reason}")]
    InvalidPolicyName {
        /// The offending name.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Path prefix failed validation.
    #[error("invalid path prefix `{path}`: {reason}")]
    InvalidPathPrefix {
        /// The offending path prefix.
        path: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Version identifier could not be parsed.
    #[error("invalid version id `{id}`")]
    InvalidVersionId {
        /// The offending identifier string.
        id: String,
    },

    /// Policy body is not a usable document.
    #[error("invalid policy document: {reason}")]
    InvalidDocument {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Policy body could not be parsed as JSON.
    #[error("malformed policy document: {source}")]
    MalformedDocument {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}
