//! Configuration schema definitions.
//!
//! This module defines the domain file that seeds the configuration store,
//! plus the tool's own settings. All types derive Serde traits for
//! deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::store::{ObjectType, RefKind};

/// Root of a domain file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DomainConfig {
    /// Settings of the admin tool itself.
    pub admin: AdminSettings,

    /// Cluster definitions.
    pub clusters: Vec<ClusterConfig>,

    /// Server definitions (admin server, clustered and standalone instances).
    pub servers: Vec<ServerConfig>,

    /// Deployed applications.
    pub applications: Vec<ApplicationConfig>,

    /// Load balancer definitions.
    pub load_balancers: Vec<LoadBalancerConfig>,

    /// LB configs with their initial target references.
    pub lb_configs: Vec<LbConfigSection>,
}

/// Admin tool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminSettings {
    /// Log level (trace, debug, info, warn, error), overridden by `RUST_LOG`.
    pub log_level: String,

    /// Values used when a health checker URL is given without interval/timeout.
    pub health_checker: HealthCheckerDefaults,
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            health_checker: HealthCheckerDefaults::default(),
        }
    }
}

/// Health checker defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckerDefaults {
    /// Path to check.
    pub url: String,

    /// Check interval in seconds.
    pub interval_secs: u32,

    /// Check timeout in seconds.
    pub timeout_secs: u32,
}

impl Default for HealthCheckerDefaults {
    fn default() -> Self {
        Self {
            url: "/".to_string(),
            interval_secs: 30,
            timeout_secs: 10,
        }
    }
}

/// Cluster definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub name: String,

    /// Applications deployed to the cluster.
    #[serde(default)]
    pub application_refs: Vec<ApplicationRefConfig>,
}

/// Server definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub name: String,

    /// Owning cluster, if any.
    #[serde(default)]
    pub cluster: Option<String>,

    /// Marks the administrative server.
    #[serde(default)]
    pub admin: bool,

    /// Whether the load balancer routes to this instance (clustered instances).
    #[serde(default)]
    pub lb_enabled: bool,

    /// Applications deployed to the server.
    #[serde(default)]
    pub application_refs: Vec<ApplicationRefConfig>,
}

/// Application deployment on a cluster or server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApplicationRefConfig {
    /// Name of the referenced application.
    #[serde(rename = "ref")]
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub lb_enabled: bool,

    #[serde(default = "default_disable_timeout")]
    pub disable_timeout_in_minutes: u32,
}

fn default_true() -> bool {
    true
}

fn default_disable_timeout() -> u32 {
    30
}

/// Application definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub name: String,

    /// `user` (default) or `system`.
    #[serde(default)]
    pub object_type: ObjectType,
}

/// Load balancer definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadBalancerConfig {
    pub name: String,

    /// Name of the LB config this load balancer uses.
    pub lb_config_name: String,
}

/// LB config definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LbConfigSection {
    pub name: String,

    /// Target references in order.
    #[serde(default)]
    pub refs: Vec<RefSection>,
}

/// Initial target reference of an LB config.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefSection {
    pub kind: RefKind,

    /// Referenced cluster or server.
    #[serde(rename = "ref")]
    pub name: String,

    #[serde(default)]
    pub policy: Option<String>,

    #[serde(default)]
    pub policy_module: Option<String>,

    #[serde(default)]
    pub lb_enabled: bool,
}
