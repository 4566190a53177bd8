//! `enable-http-lb-server`: let the load balancer route to a target's instances.

use std::sync::Arc;

use crate::admin::params::Parameters;
use crate::admin::AdminCommand;
use crate::error::{AdminError, AdminResult, ObjectKind};
use crate::store::{ConfigNode, ConfigStore, ServerRef};
use crate::target::{ResolvedTarget, TargetResolver};

pub const NAME: &str = "enable-http-lb-server";

/// Sets `lb_enabled` on the server references of a target.
///
/// For a cluster these are the cluster's member references. For a clustered
/// instance it is the instance's member reference. For a standalone
/// instance it is every LB config server-ref naming it.
///
/// Parameters: `target`.
pub struct EnableServerCommand {
    store: Arc<ConfigStore>,
}

impl EnableServerCommand {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    fn server_refs(&self, target: &ResolvedTarget) -> AdminResult<Vec<ConfigNode<ServerRef>>> {
        match target {
            ResolvedTarget::Cluster(cluster) => Ok(cluster.members.clone()),
            ResolvedTarget::Server(server) => {
                let refs = match &server.cluster {
                    Some(cluster) => self
                        .store
                        .cluster(cluster)
                        .map(|c| {
                            c.members
                                .iter()
                                .filter(|m| m.snapshot().name == server.name)
                                .cloned()
                                .collect()
                        })
                        .unwrap_or_default(),
                    None => self.store.server_refs_for(&server.name),
                };
                if refs.is_empty() {
                    return Err(AdminError::not_found(ObjectKind::ServerRef, server.name.as_str()));
                }
                Ok(refs)
            }
        }
    }
}

impl AdminCommand for EnableServerCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, params: &Parameters) -> AdminResult<String> {
        let name = params.require("target")?;
        let target = TargetResolver::new(&self.store).resolve(name)?;

        let mutator = self.store.mutator();
        let mut enabled = 0;
        for node in self.server_refs(&target)? {
            if node.snapshot().lb_enabled {
                continue;
            }
            mutator.apply(&node, |tx| {
                tx.lb_enabled = true;
                Ok(())
            })?;
            enabled += 1;
        }

        tracing::info!(target = %name, enabled, "Enabled load balancing for instances");
        Ok(format!("Enabled {} instance(s) of {} for load balancing", enabled, name))
    }
}
