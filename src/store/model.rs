//! Node types of the configuration tree.

use serde::{Deserialize, Serialize};

use crate::store::node::{ConfigNode, NodeKey, PropertyVeto, Validate};

/// Element names used in node keys.
pub const LB_CONFIG: &str = "lb-config";
pub const CLUSTER_REF: &str = "cluster-ref";
pub const SERVER_REF: &str = "server-ref";
pub const APPLICATION_REF: &str = "application-ref";
pub const HEALTH_CHECKER: &str = "health-checker";

/// Load balancing policies accepted on a cluster reference.
pub const ROUND_ROBIN: &str = "round-robin";
pub const WEIGHTED_ROUND_ROBIN: &str = "weighted-round-robin";
pub const USER_DEFINED: &str = "user-defined";
pub const POLICIES: [&str; 3] = [ROUND_ROBIN, WEIGHTED_ROUND_ROBIN, USER_DEFINED];

fn require_name(name: &str) -> Result<(), PropertyVeto> {
    if name.trim().is_empty() {
        return Err(PropertyVeto::new("ref", "must not be empty"));
    }
    Ok(())
}

/// Kind of a target reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefKind {
    Cluster,
    Server,
}

impl std::str::FromStr for RefKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cluster" => Ok(RefKind::Cluster),
            "server" => Ok(RefKind::Server),
            other => Err(format!("unknown reference kind {:?}", other)),
        }
    }
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Cluster => f.write_str("cluster"),
            RefKind::Server => f.write_str("server"),
        }
    }
}

/// How the load balancer checks a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthChecker {
    pub url: String,
    pub interval_in_seconds: u32,
    pub timeout_in_seconds: u32,
}

impl Validate for HealthChecker {
    fn validate(&self) -> Result<(), PropertyVeto> {
        if !self.url.starts_with('/') {
            return Err(PropertyVeto::new("url", format!("{} must start with '/'", self.url)));
        }
        if self.interval_in_seconds == 0 {
            return Err(PropertyVeto::new("interval-in-seconds", "must be greater than 0"));
        }
        if self.timeout_in_seconds == 0 {
            return Err(PropertyVeto::new("timeout-in-seconds", "must be greater than 0"));
        }
        Ok(())
    }
}

/// References that may own a health checker.
pub trait HealthChecked: Clone + Validate {
    fn health_checker(&self) -> Option<&ConfigNode<HealthChecker>>;
    fn set_health_checker(&mut self, checker: ConfigNode<HealthChecker>);
}

/// Reference from an LB config to a cluster.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_checker: Option<ConfigNode<HealthChecker>>,
}

impl ClusterRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: None,
            policy_module: None,
            health_checker: None,
        }
    }
}

impl Validate for ClusterRef {
    fn validate(&self) -> Result<(), PropertyVeto> {
        require_name(&self.name)?;
        if let Some(policy) = &self.policy {
            if !POLICIES.contains(&policy.as_str()) {
                return Err(PropertyVeto::new(
                    "lb-policy",
                    format!("{} is not one of {}", policy, POLICIES.join(", ")),
                ));
            }
            let has_module = self.policy_module.as_deref().is_some_and(|m| !m.trim().is_empty());
            if policy == USER_DEFINED && !has_module {
                return Err(PropertyVeto::new(
                    "lb-policy-module",
                    "required when lb-policy is user-defined",
                ));
            }
        }
        Ok(())
    }
}

impl HealthChecked for ClusterRef {
    fn health_checker(&self) -> Option<&ConfigNode<HealthChecker>> {
        self.health_checker.as_ref()
    }

    fn set_health_checker(&mut self, checker: ConfigNode<HealthChecker>) {
        self.health_checker = Some(checker);
    }
}

/// Reference to a server instance, either from an LB config or from the
/// cluster the instance belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct ServerRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub enabled: bool,
    pub lb_enabled: bool,
    pub disable_timeout_in_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_checker: Option<ConfigNode<HealthChecker>>,
}

impl ServerRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            lb_enabled: false,
            disable_timeout_in_minutes: 30,
            health_checker: None,
        }
    }
}

impl Validate for ServerRef {
    fn validate(&self) -> Result<(), PropertyVeto> {
        require_name(&self.name)
    }
}

impl HealthChecked for ServerRef {
    fn health_checker(&self) -> Option<&ConfigNode<HealthChecker>> {
        self.health_checker.as_ref()
    }

    fn set_health_checker(&mut self, checker: ConfigNode<HealthChecker>) {
        self.health_checker = Some(checker);
    }
}

/// Entry of an LB config's ordered reference list.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "ref", rename_all = "kebab-case")]
pub enum TargetRef {
    Cluster(ConfigNode<ClusterRef>),
    Server(ConfigNode<ServerRef>),
}

impl TargetRef {
    pub fn kind(&self) -> RefKind {
        match self {
            TargetRef::Cluster(_) => RefKind::Cluster,
            TargetRef::Server(_) => RefKind::Server,
        }
    }

    pub fn name(&self) -> String {
        match self {
            TargetRef::Cluster(node) => node.snapshot().name.clone(),
            TargetRef::Server(node) => node.snapshot().name.clone(),
        }
    }

    pub fn key(&self) -> &NodeKey {
        match self {
            TargetRef::Cluster(node) => node.key(),
            TargetRef::Server(node) => node.key(),
        }
    }
}

/// A load balancer configuration and its target references.
#[derive(Debug, Clone, Serialize)]
pub struct LbConfig {
    pub name: String,
    pub refs: Vec<TargetRef>,
}

impl LbConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            refs: Vec::new(),
        }
    }

    /// True if a reference of `kind` to `name` exists.
    pub fn contains(&self, kind: RefKind, name: &str) -> bool {
        self.refs
            .iter()
            .any(|r| r.kind() == kind && r.name() == name)
    }

    pub fn cluster_ref(&self, name: &str) -> Option<&ConfigNode<ClusterRef>> {
        self.refs.iter().find_map(|r| match r {
            TargetRef::Cluster(node) if node.snapshot().name == name => Some(node),
            _ => None,
        })
    }

    pub fn server_ref(&self, name: &str) -> Option<&ConfigNode<ServerRef>> {
        self.refs.iter().find_map(|r| match r {
            TargetRef::Server(node) if node.snapshot().name == name => Some(node),
            _ => None,
        })
    }
}

impl Validate for LbConfig {
    fn validate(&self) -> Result<(), PropertyVeto> {
        for (i, entry) in self.refs.iter().enumerate() {
            let (kind, name) = (entry.kind(), entry.name());
            if self.refs[..i].iter().any(|r| r.kind() == kind && r.name() == name) {
                return Err(PropertyVeto::new(
                    "cluster-ref-or-server-ref",
                    format!("duplicate {} reference {}", kind, name),
                ));
            }
        }
        Ok(())
    }
}

/// Deployment of an application on a cluster or server.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub enabled: bool,
    pub lb_enabled: bool,
    pub disable_timeout_in_minutes: u32,
}

impl Validate for ApplicationRef {
    fn validate(&self) -> Result<(), PropertyVeto> {
        require_name(&self.name)
    }
}

/// Classification of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    #[default]
    User,
    System,
}

/// A deployed application.
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    pub object_type: ObjectType,
}

/// An application reference bound to a target, with its classification.
#[derive(Debug, Clone)]
pub struct ApplicationReference {
    pub name: String,
    pub object_type: ObjectType,
    pub node: ConfigNode<ApplicationRef>,
}

impl ApplicationReference {
    pub fn is_user_app(&self) -> bool {
        self.object_type == ObjectType::User
    }
}

/// A cluster and its member instances.
#[derive(Debug)]
pub struct Cluster {
    pub name: String,
    pub members: Vec<ConfigNode<ServerRef>>,
    pub application_refs: Vec<ConfigNode<ApplicationRef>>,
}

/// A server: the admin server, a clustered instance or a standalone instance.
#[derive(Debug)]
pub struct Server {
    pub name: String,
    pub cluster: Option<String>,
    pub admin: bool,
    pub application_refs: Vec<ConfigNode<ApplicationRef>>,
}

impl Server {
    /// True for every server except the admin server.
    pub fn is_instance(&self) -> bool {
        !self.admin
    }

    /// An instance that belongs to no cluster.
    pub fn is_standalone_instance(&self) -> bool {
        self.cluster.is_none() && self.is_instance()
    }
}

/// A load balancer and the LB config it uses.
#[derive(Debug, Clone)]
pub struct LoadBalancer {
    pub name: String,
    pub lb_config_name: String,
}
