//! Contract for the remote service holding policies and their version history.
//!
//! [`ExternalPolicyStore`] is the seam the deployment engine talks through;
//! [`InMemoryPolicyStore`] implements it with the retention and escaping
//! behaviour of IAM so deploys can be exercised without a cloud account.

#![warn(missing_docs, clippy::pedantic)]

mod memory;
mod traits;

pub use memory::{InMemoryPolicyStore, StoreCall, StoreOperation};
pub use traits::{ExternalPolicyStore, StoreError, StoreResult};
