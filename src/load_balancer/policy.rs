//! Load balancing policy assignment on cluster references.

use crate::error::AdminResult;
use crate::store::{ClusterRef, ConfigMutator, ConfigNode};

/// Sets `policy` / `policy_module` on cluster references.
#[derive(Debug, Clone, Copy)]
pub struct PolicyUpdater<'a> {
    mutator: &'a ConfigMutator,
}

impl<'a> PolicyUpdater<'a> {
    pub fn new(mutator: &'a ConfigMutator) -> Self {
        Self { mutator }
    }

    /// Set the given attributes, leaving omitted ones unchanged.
    pub fn update_policy(
        &self,
        cluster_ref: &ConfigNode<ClusterRef>,
        policy: Option<&str>,
        policy_module: Option<&str>,
    ) -> AdminResult<()> {
        if policy.is_none() && policy_module.is_none() {
            return Ok(());
        }

        self.mutator.apply(cluster_ref, |tx| {
            if let Some(policy) = policy {
                tx.policy = Some(policy.to_string());
            }
            if let Some(module) = policy_module {
                tx.policy_module = Some(module.to_string());
            }
            Ok(())
        })?;

        tracing::info!(
            cluster_ref = %cluster_ref.key(),
            policy = ?policy,
            policy_module = ?policy_module,
            "Updated load balancing policy"
        );
        Ok(())
    }
}
