//! Configuration store subsystem.
//!
//! # Data Flow
//! ```text
//! DomainConfig (validated)
//!     → tree.rs (build nodes, index by name)
//!     → ConfigStore (shared via Arc by all commands)
//!
//! On change:
//!     command → mutator.rs apply(node, edit)
//!         → lock node → clone snapshot → edit → validate → vetoers
//!         → publish new snapshot (or drop the staged copy)
//! ```
//!
//! # Design Decisions
//! - Each node is its own unit of atomicity; there are no multi-node
//!   transactions
//! - References are a sum type (`TargetRef`), not a class hierarchy
//! - Nothing here deletes an LB config

pub mod model;
pub mod mutator;
pub mod node;
pub mod tree;

pub use model::{
    Application, ApplicationRef, ApplicationReference, Cluster, ClusterRef, HealthChecked,
    HealthChecker, LbConfig, LoadBalancer, ObjectType, RefKind, Server, ServerRef, TargetRef,
};
pub use mutator::{CommitVeto, ConfigMutator, EditOutcome, Transaction, TransactionFailure};
pub use node::{ConfigNode, NodeKey, PropertyVeto, Validate};
pub use tree::ConfigStore;
