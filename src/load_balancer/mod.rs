//! Load balancer configuration subsystem.
//!
//! # Data Flow
//! ```text
//! create-http-lb-ref
//!     → refs.rs (ensure cluster-ref / server-ref under the LB config)
//!     → policy.rs (set lb-policy / lb-policy-module on the cluster-ref)
//!     → store mutator (one atomic apply per call)
//! ```
//!
//! # Design Decisions
//! - Reference creation is idempotent
//! - Only standalone instances may be referenced as servers
//! - Policy attributes exist on cluster references only

pub mod policy;
pub mod refs;

pub use policy::PolicyUpdater;
pub use refs::{RefCreator, RefOutcome};
