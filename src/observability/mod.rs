//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stderr (fmt layer, filtered by RUST_LOG or the configured level)
//!     → whatever recorder the embedding process installs
//! ```
//!
//! # Design Decisions
//! - Each command invocation runs in a span carrying its invocation id
//! - No metrics exporter is installed by the CLI; without a recorder the
//!   counters are no-ops

pub mod logging;
pub mod metrics;
