//! Load balancer reference administration.
//!
//! Adds cluster and standalone-instance references to load balancer
//! configurations, with optional health checker, enablement and policy
//! steps. Every change goes through a per-node atomic apply.

pub mod admin;
pub mod config;
pub mod error;
pub mod load_balancer;
pub mod observability;
pub mod store;
pub mod target;

pub use admin::{ActionReport, CommandService, CreateLbRef, CreateLbRefRequest};
pub use config::DomainConfig;
pub use error::{AdminError, AdminResult};
pub use store::ConfigStore;
