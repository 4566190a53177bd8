//! `create-http-health-checker`: attach a health checker to a target reference.

use std::sync::Arc;

use crate::admin::params::Parameters;
use crate::admin::AdminCommand;
use crate::error::{AdminError, AdminResult, ObjectKind};
use crate::store::model::HEALTH_CHECKER;
use crate::store::{
    ConfigMutator, ConfigNode, ConfigStore, HealthChecked, HealthChecker, RefKind,
};

pub const NAME: &str = "create-http-health-checker";

/// Creates the health checker of a cluster-ref or server-ref.
///
/// Parameters: `config`, `target`, `kind` (`cluster` or `server`), `url`,
/// `interval`, `timeout`.
pub struct HealthCheckerCommand {
    store: Arc<ConfigStore>,
}

impl HealthCheckerCommand {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }
}

impl AdminCommand for HealthCheckerCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, params: &Parameters) -> AdminResult<String> {
        let config_name = params.require("config")?;
        let target = params.require("target")?;
        let kind: RefKind = params.parse("kind")?;
        let checker = HealthChecker {
            url: params.require("url")?.to_string(),
            interval_in_seconds: params.parse("interval")?,
            timeout_in_seconds: params.parse("timeout")?,
        };

        let config = self
            .store
            .lb_config(config_name)
            .ok_or_else(|| AdminError::not_found(ObjectKind::LbConfig, config_name))?
            .snapshot();

        let mutator = self.store.mutator();
        let reference = match kind {
            RefKind::Cluster => {
                let node = config
                    .cluster_ref(target)
                    .ok_or_else(|| AdminError::not_found(ObjectKind::ClusterRef, target))?;
                attach(mutator, node, target, checker)?;
                node.key()
            }
            RefKind::Server => {
                let node = config
                    .server_ref(target)
                    .ok_or_else(|| AdminError::not_found(ObjectKind::ServerRef, target))?;
                attach(mutator, node, target, checker)?;
                node.key()
            }
        };

        tracing::info!(reference = %reference, "Created health checker");
        Ok(format!("Health checker created for {}", target))
    }
}

fn attach<T: HealthChecked>(
    mutator: &ConfigMutator,
    node: &ConfigNode<T>,
    target: &str,
    checker: HealthChecker,
) -> AdminResult<()> {
    let exists = || AdminError::AlreadyExists {
        kind: ObjectKind::HealthChecker,
        name: target.to_string(),
    };
    if node.snapshot().health_checker().is_some() {
        return Err(exists());
    }

    let created = mutator.apply(node, |tx| {
        if tx.health_checker().is_some() {
            return Ok(false);
        }
        let child = tx.create_child(HEALTH_CHECKER, target, checker)?;
        tx.set_health_checker(child);
        Ok(true)
    })?;

    if created.value {
        Ok(())
    } else {
        Err(exists())
    }
}
