//! Configuration tree nodes.
//!
//! # Responsibilities
//! - Give every node a stable, path-like key
//! - Hold the last committed value of a node as an immutable snapshot
//! - Carry the per-node write lock and version used by the mutator
//!
//! # Design Decisions
//! - Readers load an `Arc` snapshot and never block on writers
//! - Only `ConfigMutator` can replace a snapshot
//! - Child nodes are held by their parent's value, so a child that is never
//!   committed into a parent is unreachable

use arc_swap::ArcSwap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Stable address of a node, e.g. `lb-configs/lb-config[lb1]/cluster-ref[c1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Key of a top-level collection.
    pub fn root(collection: &str) -> Self {
        Self(collection.to_string())
    }

    /// Key of the `element` named `name` under this node.
    pub fn child(&self, element: &str, name: &str) -> Self {
        Self(format!("{}/{}[{}]", self.0, element, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element name of the last path segment (`cluster-ref` for the example above).
    pub fn element(&self) -> &str {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        last.split('[').next().unwrap_or(last)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rejected property value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{property}: {reason}")]
pub struct PropertyVeto {
    pub property: &'static str,
    pub reason: String,
}

impl PropertyVeto {
    pub fn new(property: &'static str, reason: impl Into<String>) -> Self {
        Self {
            property,
            reason: reason.into(),
        }
    }
}

/// Property constraints checked before a value is committed.
pub trait Validate {
    fn validate(&self) -> Result<(), PropertyVeto> {
        Ok(())
    }
}

/// A node of the configuration tree.
///
/// Cloning a `ConfigNode` clones the handle, not the value: all clones see
/// the same commits.
pub struct ConfigNode<T> {
    inner: Arc<NodeCell<T>>,
}

struct NodeCell<T> {
    key: NodeKey,
    current: ArcSwap<T>,
    version: AtomicU64,
    write_lock: Mutex<()>,
}

impl<T> ConfigNode<T> {
    /// Create a node holding `value` at version 0.
    pub fn new(key: NodeKey, value: T) -> Self {
        Self {
            inner: Arc::new(NodeCell {
                key,
                current: ArcSwap::from_pointee(value),
                version: AtomicU64::new(0),
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn key(&self) -> &NodeKey {
        &self.inner.key
    }

    /// The last committed value.
    pub fn snapshot(&self) -> Arc<T> {
        self.inner.current.load_full()
    }

    /// Number of commits applied to this node.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    pub(crate) fn write_lock(&self) -> &Mutex<()> {
        &self.inner.write_lock
    }

    /// Publish a new value. Callers must hold the write lock.
    pub(crate) fn publish(&self, value: T) -> u64 {
        self.inner.current.store(Arc::new(value));
        self.inner.version.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl<T> Clone for ConfigNode<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for ConfigNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigNode")
            .field("key", &self.inner.key)
            .field("version", &self.version())
            .finish()
    }
}

impl<T: Serialize> Serialize for ConfigNode<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().as_ref().serialize(serializer)
    }
}
