//! Atomic per-node edits.
//!
//! # Responsibilities
//! - Run an edit closure against a private copy of one node
//! - Validate the staged copy and consult commit vetoers
//! - Publish the copy as the node's new snapshot, or discard it
//!
//! # Design Decisions
//! - One writer per node at a time (per-node mutex); unrelated nodes commit
//!   in parallel
//! - No retries: every failure goes back to the caller
//! - Edits are not nested: a transaction covers exactly one node

use arc_swap::ArcSwap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics;
use crate::store::node::{ConfigNode, NodeKey, PropertyVeto, Validate};

/// Why a transaction did not commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionFailure {
    /// The edit function, or validation of the staged value, rejected a property.
    #[error("Transaction on {key} vetoed: {veto}")]
    Veto { key: NodeKey, veto: PropertyVeto },

    /// The store refused the commit.
    #[error("Commit on {key} rejected: {reason}")]
    Rejected { key: NodeKey, reason: String },

    /// A previous writer panicked while holding the node's write lock.
    #[error("Write lock on {key} is poisoned")]
    Poisoned { key: NodeKey },
}

impl TransactionFailure {
    fn reason_label(&self) -> &'static str {
        match self {
            TransactionFailure::Veto { .. } => "veto",
            TransactionFailure::Rejected { .. } => "rejected",
            TransactionFailure::Poisoned { .. } => "poisoned",
        }
    }
}

/// Result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome<R> {
    /// Value returned by the edit function.
    pub value: R,
    /// Node version after the commit.
    pub version: u64,
}

/// A hook that may refuse commits, checked after validation.
pub trait CommitVeto: Send + Sync {
    fn check(&self, key: &NodeKey) -> Result<(), String>;
}

impl<F> CommitVeto for F
where
    F: Fn(&NodeKey) -> Result<(), String> + Send + Sync,
{
    fn check(&self, key: &NodeKey) -> Result<(), String> {
        self(key)
    }
}

/// Staged copy of a node handed to an edit function.
pub struct Transaction<'a, T> {
    key: &'a NodeKey,
    staged: T,
}

impl<'a, T> Transaction<'a, T> {
    /// Key of the node being edited.
    pub fn key(&self) -> &NodeKey {
        self.key
    }

    /// Create a child node under the node being edited.
    ///
    /// The child only becomes visible if the caller stores it in the staged
    /// value and the transaction commits.
    pub fn create_child<C: Validate>(
        &self,
        element: &str,
        name: &str,
        value: C,
    ) -> Result<ConfigNode<C>, PropertyVeto> {
        value.validate()?;
        Ok(ConfigNode::new(self.key.child(element, name), value))
    }
}

impl<T> Deref for Transaction<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.staged
    }
}

impl<T> DerefMut for Transaction<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.staged
    }
}

/// The single gateway for configuration changes.
#[derive(Clone, Default)]
pub struct ConfigMutator {
    vetoers: Arc<ArcSwap<Vec<Arc<dyn CommitVeto>>>>,
}

impl ConfigMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook consulted before every commit.
    pub fn register_veto(&self, veto: Arc<dyn CommitVeto>) {
        self.vetoers.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(veto.clone());
            next
        });
    }

    /// Apply `edit` to `node` as one atomic unit.
    ///
    /// Either every change made by `edit` is published, or none is.
    pub fn apply<T, R, F>(
        &self,
        node: &ConfigNode<T>,
        edit: F,
    ) -> Result<EditOutcome<R>, TransactionFailure>
    where
        T: Clone + Validate,
        F: FnOnce(&mut Transaction<'_, T>) -> Result<R, PropertyVeto>,
    {
        let key = node.key();
        let result = self.commit(node, edit);
        match &result {
            Ok(outcome) => {
                tracing::debug!(node = %key, version = outcome.version, "Transaction committed");
                metrics::record_commit(key.element());
            }
            Err(failure) => {
                tracing::debug!(node = %key, error = %failure, "Transaction rolled back");
                metrics::record_commit_failure(key.element(), failure.reason_label());
            }
        }
        result
    }

    fn commit<T, R, F>(
        &self,
        node: &ConfigNode<T>,
        edit: F,
    ) -> Result<EditOutcome<R>, TransactionFailure>
    where
        T: Clone + Validate,
        F: FnOnce(&mut Transaction<'_, T>) -> Result<R, PropertyVeto>,
    {
        let key = node.key();
        let _guard = node
            .write_lock()
            .lock()
            .map_err(|_| TransactionFailure::Poisoned { key: key.clone() })?;

        let mut tx = Transaction {
            key,
            staged: T::clone(&node.snapshot()),
        };

        let vetoed = |veto: PropertyVeto| TransactionFailure::Veto {
            key: key.clone(),
            veto,
        };
        let value = edit(&mut tx).map_err(vetoed)?;
        tx.staged.validate().map_err(vetoed)?;

        for vetoer in self.vetoers.load().iter() {
            vetoer.check(key).map_err(|reason| TransactionFailure::Rejected {
                key: key.clone(),
                reason,
            })?;
        }

        let version = node.publish(tx.staged);
        Ok(EditOutcome { value, version })
    }
}

impl std::fmt::Debug for ConfigMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMutator")
            .field("vetoers", &self.vetoers.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Bag {
        items: Vec<ConfigNode<Item>>,
        label: String,
    }

    impl Validate for Bag {
        fn validate(&self) -> Result<(), PropertyVeto> {
            if self.label == "bad" {
                return Err(PropertyVeto::new("label", "must not be bad"));
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    struct Item(String);

    impl Validate for Item {
        fn validate(&self) -> Result<(), PropertyVeto> {
            if self.0.is_empty() {
                return Err(PropertyVeto::new("name", "must not be empty"));
            }
            Ok(())
        }
    }

    impl Validate for u64 {}

    fn bag() -> ConfigNode<Bag> {
        ConfigNode::new(NodeKey::root("bags").child("bag", "b1"), Bag::default())
    }

    #[test]
    fn test_commit_publishes_edit() {
        let mutator = ConfigMutator::new();
        let node = bag();

        let outcome = mutator
            .apply(&node, |tx| {
                let item = tx.create_child("item", "one", Item("one".into()))?;
                tx.items.push(item);
                tx.label = "full".into();
                Ok(tx.items.len())
            })
            .unwrap();

        assert_eq!(outcome, EditOutcome { value: 1, version: 1 });
        let snapshot = node.snapshot();
        assert_eq!(snapshot.label, "full");
        assert_eq!(snapshot.items[0].key().as_str(), "bags/bag[b1]/item[one]");
    }

    #[test]
    fn test_failed_edit_leaves_no_trace() {
        let mutator = ConfigMutator::new();
        let node = bag();

        let result = mutator.apply(&node, |tx| {
            tx.label = "half".into();
            let good = tx.create_child("item", "one", Item("one".into()))?;
            tx.items.push(good);
            let bad = tx.create_child("item", "", Item(String::new()))?;
            tx.items.push(bad);
            Ok(())
        });

        assert!(matches!(result, Err(TransactionFailure::Veto { .. })));
        let snapshot = node.snapshot();
        assert!(snapshot.items.is_empty());
        assert!(snapshot.label.is_empty());
        assert_eq!(node.version(), 0);
    }

    #[test]
    fn test_staged_value_is_validated() {
        let mutator = ConfigMutator::new();
        let node = bag();

        let err = mutator
            .apply(&node, |tx| {
                tx.label = "bad".into();
                Ok(())
            })
            .unwrap_err();

        assert_eq!(
            err,
            TransactionFailure::Veto {
                key: node.key().clone(),
                veto: PropertyVeto::new("label", "must not be bad"),
            }
        );
        assert!(node.snapshot().label.is_empty());
    }

    #[test]
    fn test_veto_rejects_commit() {
        let mutator = ConfigMutator::new();
        mutator.register_veto(Arc::new(|key: &NodeKey| {
            if key.element() == "bag" {
                Err("store is read-only".to_string())
            } else {
                Ok(())
            }
        }));
        let node = bag();

        let err = mutator
            .apply(&node, |tx| {
                tx.label = "x".into();
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(
            err,
            TransactionFailure::Rejected { ref reason, .. } if reason == "store is read-only"
        ));
        assert_eq!(node.version(), 0);
    }

    #[test]
    fn test_concurrent_writers_are_serialized() {
        let mutator = ConfigMutator::new();
        let node = ConfigNode::new(NodeKey::root("counter"), 0u64);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        mutator
                            .apply(&node, |tx| {
                                **tx += 1;
                                Ok(())
                            })
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(*node.snapshot(), 800);
        assert_eq!(node.version(), 800);
    }
}
