//! Target reference creation.
//!
//! # Responsibilities
//! - Ensure an LB config references a cluster or a standalone instance
//! - Reject server references to clustered instances and the admin server
//!
//! # Design Decisions
//! - Idempotent: an existing reference is a no-op success
//! - The existence check is repeated inside the transaction so concurrent
//!   callers still end up with a single reference

use crate::error::{AdminError, AdminResult, ObjectKind, TargetKindViolation};
use crate::store::model::{CLUSTER_REF, SERVER_REF};
use crate::store::{ClusterRef, ConfigNode, ConfigStore, LbConfig, RefKind, ServerRef, TargetRef};

/// What `ensure_*_ref` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefOutcome {
    Created,
    AlreadyPresent,
}

/// Adds cluster and server references to LB configs.
#[derive(Debug, Clone, Copy)]
pub struct RefCreator<'a> {
    store: &'a ConfigStore,
}

impl<'a> RefCreator<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Ensure `config` references the cluster `cluster`.
    pub fn ensure_cluster_ref(
        &self,
        config: &ConfigNode<LbConfig>,
        cluster: &str,
    ) -> AdminResult<RefOutcome> {
        if config.snapshot().contains(RefKind::Cluster, cluster) {
            tracing::debug!(
                lb_config = %config.key(),
                cluster = %cluster,
                "cluster-ref already exists"
            );
            return Ok(RefOutcome::AlreadyPresent);
        }

        let outcome = self.store.mutator().apply(config, |tx| {
            if tx.contains(RefKind::Cluster, cluster) {
                return Ok(RefOutcome::AlreadyPresent);
            }
            let child = tx.create_child(CLUSTER_REF, cluster, ClusterRef::new(cluster))?;
            tx.refs.push(TargetRef::Cluster(child));
            Ok(RefOutcome::Created)
        })?;

        if outcome.value == RefOutcome::Created {
            tracing::info!(
                cluster = %cluster,
                lb_config = %config.snapshot().name,
                "Added cluster to load balancer config"
            );
        }
        Ok(outcome.value)
    }

    /// Ensure `config` references the standalone instance `server`.
    pub fn ensure_server_ref(
        &self,
        config: &ConfigNode<LbConfig>,
        server: &str,
    ) -> AdminResult<RefOutcome> {
        if config.snapshot().contains(RefKind::Server, server) {
            tracing::debug!(
                lb_config = %config.key(),
                server = %server,
                "server-ref already exists"
            );
            return Ok(RefOutcome::AlreadyPresent);
        }

        let instance = self
            .store
            .server(server)
            .ok_or_else(|| AdminError::not_found(ObjectKind::Server, server))?;
        if !instance.is_standalone_instance() {
            return Err(AdminError::invalid_target_kind(
                server,
                TargetKindViolation::NotStandaloneInstance,
            ));
        }

        let outcome = self.store.mutator().apply(config, |tx| {
            if tx.contains(RefKind::Server, server) {
                return Ok(RefOutcome::AlreadyPresent);
            }
            let child = tx.create_child(SERVER_REF, server, ServerRef::new(server))?;
            tx.refs.push(TargetRef::Server(child));
            Ok(RefOutcome::Created)
        })?;

        if outcome.value == RefOutcome::Created {
            tracing::info!(
                server = %server,
                lb_config = %config.snapshot().name,
                "Added server to load balancer config"
            );
        }
        Ok(outcome.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;
    use crate::store::{PropertyVeto, TransactionFailure};

    fn store() -> ConfigStore {
        let config = parse_config(
            r#"
            [[clusters]]
            name = "cluster1"

            [[servers]]
            name = "server"
            admin = true

            [[servers]]
            name = "c1-inst1"
            cluster = "cluster1"

            [[servers]]
            name = "instance1"

            [[lb_configs]]
            name = "lb-config-1"
            "#,
        )
        .unwrap();
        ConfigStore::from_config(&config)
    }

    #[test]
    fn test_cluster_ref_is_idempotent() {
        let store = store();
        let config = store.lb_config("lb-config-1").unwrap();
        let creator = RefCreator::new(&store);

        assert_eq!(creator.ensure_cluster_ref(&config, "cluster1").unwrap(), RefOutcome::Created);
        assert_eq!(
            creator.ensure_cluster_ref(&config, "cluster1").unwrap(),
            RefOutcome::AlreadyPresent
        );

        let snapshot = config.snapshot();
        assert_eq!(snapshot.refs.len(), 1);
        assert_eq!(
            snapshot.refs[0].key().as_str(),
            "lb-configs/lb-config[lb-config-1]/cluster-ref[cluster1]"
        );
        assert_eq!(config.version(), 1);
    }

    #[test]
    fn test_server_ref_for_standalone_instance() {
        let store = store();
        let config = store.lb_config("lb-config-1").unwrap();
        let creator = RefCreator::new(&store);

        assert_eq!(creator.ensure_server_ref(&config, "instance1").unwrap(), RefOutcome::Created);
        assert_eq!(
            creator.ensure_server_ref(&config, "instance1").unwrap(),
            RefOutcome::AlreadyPresent
        );
        assert!(config.snapshot().server_ref("instance1").is_some());
    }

    #[test]
    fn test_server_ref_rejects_clustered_and_admin_servers() {
        let store = store();
        let config = store.lb_config("lb-config-1").unwrap();
        let creator = RefCreator::new(&store);

        for name in ["c1-inst1", "server"] {
            let err = creator.ensure_server_ref(&config, name).unwrap_err();
            assert!(matches!(
                err,
                AdminError::InvalidTargetKind {
                    violation: TargetKindViolation::NotStandaloneInstance,
                    ..
                }
            ));
        }
        assert!(config.snapshot().refs.is_empty());
        assert_eq!(config.version(), 0);
    }

    #[test]
    fn test_unknown_server() {
        let store = store();
        let config = store.lb_config("lb-config-1").unwrap();
        let err = RefCreator::new(&store).ensure_server_ref(&config, "ghost").unwrap_err();
        assert!(matches!(err, AdminError::NotFound { kind: ObjectKind::Server, .. }));
    }

    #[test]
    fn test_invalid_child_leaves_config_untouched() {
        let store = store();
        let config = store.lb_config("lb-config-1").unwrap();

        let err = RefCreator::new(&store).ensure_cluster_ref(&config, " ").unwrap_err();
        assert!(matches!(
            err,
            AdminError::Transaction(TransactionFailure::Veto {
                veto: PropertyVeto { property: "ref", .. },
                ..
            })
        ));
        assert!(config.snapshot().refs.is_empty());
    }

    #[test]
    fn test_rejected_commit_is_fatal() {
        let store = store();
        store
            .mutator()
            .register_veto(std::sync::Arc::new(
                |_: &crate::store::NodeKey| -> Result<(), String> { Err("disk full".to_string()) },
            ));
        let config = store.lb_config("lb-config-1").unwrap();

        let err = RefCreator::new(&store).ensure_cluster_ref(&config, "cluster1").unwrap_err();
        assert!(matches!(err, AdminError::Transaction(TransactionFailure::Rejected { .. })));
        assert!(config.snapshot().refs.is_empty());
    }
}
