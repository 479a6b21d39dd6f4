//! Policy deployment engine.
//!
//! [`PolicyDeploymentEngine`] publishes a [`PolicyDocument`](policy_primitives::PolicyDocument)
//! to an [`ExternalPolicyStore`](policy_store::ExternalPolicyStore): it creates the
//! policy when absent, does nothing when the default version already carries the
//! document, and otherwise creates a new default version, rotating out the oldest
//! non-default version first when the retention cap is reached.
//!
//! Deploys targeting the same policy must be serialised by the caller; the engine
//! holds no lock. Deploys of different policies may run concurrently.

#![warn(missing_docs, clippy::pedantic)]

mod cancel;
mod engine;
mod error;
mod events;
mod rotation;

pub use cancel::CancelSignal;
pub use engine::{EngineBuilder, PolicyDeploymentEngine};
pub use error::{DeployError, EngineResult};
pub use events::{CollectingObserver, DeployEvent, DeployEventKind, DeployObserver, NoopObserver};
pub use rotation::{DEFAULT_MAX_VERSIONS, RotationError, SlotAction, VersionHistoryManager};
