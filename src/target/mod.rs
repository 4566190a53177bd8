//! Target resolution subsystem.
//!
//! A target is the name an administrator passes to a command. It is resolved
//! once per command into a cluster or a server, never both.

pub mod resolver;

pub use resolver::{ResolvedTarget, TargetResolver};
