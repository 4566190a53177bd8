//! The configuration store.
//!
//! # Responsibilities
//! - Build the node tree from a validated domain file
//! - Look up LB configs, load balancers, clusters, servers and application
//!   references by name
//! - Own the mutator through which every change goes

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::schema::{ApplicationRefConfig, DomainConfig, RefSection};
use crate::store::model::{
    Application, ApplicationRef, ApplicationReference, Cluster, ClusterRef, LbConfig,
    LoadBalancer, RefKind, Server, ServerRef, TargetRef, APPLICATION_REF, CLUSTER_REF, LB_CONFIG,
    SERVER_REF,
};
use crate::store::mutator::ConfigMutator;
use crate::store::node::{ConfigNode, NodeKey};

/// In-memory configuration store shared by all commands.
#[derive(Debug)]
pub struct ConfigStore {
    mutator: ConfigMutator,
    lb_configs: DashMap<String, ConfigNode<LbConfig>>,
    load_balancers: HashMap<String, LoadBalancer>,
    clusters: HashMap<String, Arc<Cluster>>,
    servers: HashMap<String, Arc<Server>>,
    applications: HashMap<String, Application>,
}

impl ConfigStore {
    /// Build the store from a domain file. The file is expected to have
    /// passed `validate_config`.
    pub fn from_config(config: &DomainConfig) -> Self {
        let applications = config
            .applications
            .iter()
            .map(|a| {
                let app = Application {
                    name: a.name.clone(),
                    object_type: a.object_type,
                };
                (a.name.clone(), app)
            })
            .collect();

        let load_balancers = config
            .load_balancers
            .iter()
            .map(|lb| {
                let balancer = LoadBalancer {
                    name: lb.name.clone(),
                    lb_config_name: lb.lb_config_name.clone(),
                };
                (lb.name.clone(), balancer)
            })
            .collect();

        let clusters_key = NodeKey::root("clusters");
        let clusters = config
            .clusters
            .iter()
            .map(|c| {
                let key = clusters_key.child("cluster", &c.name);
                let members = config
                    .servers
                    .iter()
                    .filter(|s| s.cluster.as_deref() == Some(c.name.as_str()))
                    .map(|s| {
                        let mut member = ServerRef::new(&s.name);
                        member.lb_enabled = s.lb_enabled;
                        ConfigNode::new(key.child(SERVER_REF, &s.name), member)
                    })
                    .collect();
                let cluster = Cluster {
                    name: c.name.clone(),
                    members,
                    application_refs: application_refs(&key, &c.application_refs),
                };
                (c.name.clone(), Arc::new(cluster))
            })
            .collect();

        let servers_key = NodeKey::root("servers");
        let servers = config
            .servers
            .iter()
            .map(|s| {
                let key = servers_key.child("server", &s.name);
                let server = Server {
                    name: s.name.clone(),
                    cluster: s.cluster.clone(),
                    admin: s.admin,
                    application_refs: application_refs(&key, &s.application_refs),
                };
                (s.name.clone(), Arc::new(server))
            })
            .collect();

        let lb_configs_key = NodeKey::root("lb-configs");
        let lb_configs = DashMap::new();
        for section in &config.lb_configs {
            let key = lb_configs_key.child(LB_CONFIG, &section.name);
            let refs = section.refs.iter().map(|r| target_ref(&key, r)).collect();
            let node = ConfigNode::new(
                key,
                LbConfig {
                    name: section.name.clone(),
                    refs,
                },
            );
            lb_configs.insert(section.name.clone(), node);
        }

        tracing::debug!(
            lb_configs = lb_configs.len(),
            "Configuration store initialized"
        );

        Self {
            mutator: ConfigMutator::new(),
            lb_configs,
            load_balancers,
            clusters,
            servers,
            applications,
        }
    }

    pub fn mutator(&self) -> &ConfigMutator {
        &self.mutator
    }

    pub fn lb_config(&self, name: &str) -> Option<ConfigNode<LbConfig>> {
        self.lb_configs.get(name).map(|r| r.value().clone())
    }

    /// All LB configs, ordered by name.
    pub fn lb_configs(&self) -> Vec<ConfigNode<LbConfig>> {
        let mut configs: Vec<_> = self.lb_configs.iter().map(|r| r.value().clone()).collect();
        configs.sort_by(|a, b| a.key().cmp(b.key()));
        configs
    }

    pub fn load_balancer(&self, name: &str) -> Option<&LoadBalancer> {
        self.load_balancers.get(name)
    }

    pub fn cluster(&self, name: &str) -> Option<Arc<Cluster>> {
        self.clusters.get(name).cloned()
    }

    pub fn server(&self, name: &str) -> Option<Arc<Server>> {
        self.servers.get(name).cloned()
    }

    pub fn application(&self, name: &str) -> Option<&Application> {
        self.applications.get(name)
    }

    /// Application references deployed to the cluster or server `target`.
    ///
    /// References to unknown applications are treated as user applications.
    pub fn application_refs_in_target(&self, target: &str) -> Vec<ApplicationReference> {
        let nodes = if let Some(cluster) = self.clusters.get(target) {
            cluster.application_refs.clone()
        } else if let Some(server) = self.servers.get(target) {
            server.application_refs.clone()
        } else {
            Vec::new()
        };

        nodes
            .into_iter()
            .map(|node| {
                let name = node.snapshot().name.clone();
                let object_type = self
                    .application(&name)
                    .map(|a| a.object_type)
                    .unwrap_or_default();
                ApplicationReference {
                    name,
                    object_type,
                    node,
                }
            })
            .collect()
    }

    /// Server references to `server` across every LB config.
    pub fn server_refs_for(&self, server: &str) -> Vec<ConfigNode<ServerRef>> {
        self.lb_configs()
            .iter()
            .filter_map(|config| config.snapshot().server_ref(server).cloned())
            .collect()
    }
}

fn application_refs(
    parent: &NodeKey,
    refs: &[ApplicationRefConfig],
) -> Vec<ConfigNode<ApplicationRef>> {
    refs.iter()
        .map(|r| {
            let app_ref = ApplicationRef {
                name: r.name.clone(),
                enabled: r.enabled,
                lb_enabled: r.lb_enabled,
                disable_timeout_in_minutes: r.disable_timeout_in_minutes,
            };
            ConfigNode::new(parent.child(APPLICATION_REF, &r.name), app_ref)
        })
        .collect()
}

fn target_ref(parent: &NodeKey, section: &RefSection) -> TargetRef {
    match section.kind {
        RefKind::Cluster => {
            let cref = ClusterRef {
                policy: section.policy.clone(),
                policy_module: section.policy_module.clone(),
                ..ClusterRef::new(&section.name)
            };
            TargetRef::Cluster(ConfigNode::new(parent.child(CLUSTER_REF, &section.name), cref))
        }
        RefKind::Server => {
            let mut sref = ServerRef::new(&section.name);
            sref.lb_enabled = section.lb_enabled;
            TargetRef::Server(ConfigNode::new(parent.child(SERVER_REF, &section.name), sref))
        }
    }
}
