//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! domain file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DomainConfig (validated)
//!     → ConfigStore::from_config (nodes shared via Arc by all commands)
//! ```
//!
//! # Design Decisions
//! - The file only seeds the store; changes are never written back
//! - All admin settings have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AdminSettings;
pub use schema::DomainConfig;
pub use schema::HealthCheckerDefaults;
