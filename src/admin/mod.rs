//! Admin command subsystem.
//!
//! # Data Flow
//! ```text
//! CLI / embedding process
//!     → create_lb_ref.rs (workflow, runs on the caller's task)
//!         → store + load_balancer (reference, policy)
//!         → CommandRunner ──mpsc──▶ CommandService task
//!               → health_checker.rs / enable_server.rs / enable_application.rs
//!               ◀──oneshot── ActionReport
//!     → ActionReport
//! ```
//!
//! # Design Decisions
//! - Sub-commands are looked up by name; the workflow never constructs them
//! - Commands return `AdminResult<String>`; the service turns that into a report

pub mod create_lb_ref;
pub mod enable_application;
pub mod enable_server;
pub mod health_checker;
pub mod params;
pub mod report;
pub mod runner;
pub mod steps;

pub use create_lb_ref::{CreateLbRef, CreateLbRefRequest};
pub use enable_application::EnableApplicationCommand;
pub use enable_server::EnableServerCommand;
pub use health_checker::HealthCheckerCommand;
pub use params::Parameters;
pub use report::{ActionReport, ExitCode};
pub use runner::{CommandRunner, CommandService};
pub use steps::{FailurePolicy, Step};

use crate::error::AdminResult;

/// A command the command service can run by name.
pub trait AdminCommand: Send + Sync {
    /// Name the command is registered under.
    fn name(&self) -> &'static str;

    /// Run to completion. The returned message becomes the report message.
    fn execute(&self, params: &Parameters) -> AdminResult<String>;
}
