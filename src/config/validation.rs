//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (load balancers, cluster membership,
//!   application refs, LB config refs)
//! - Detect duplicate names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DomainConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the store

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::schema::{ApplicationRefConfig, DomainConfig};
use crate::store::RefKind;

/// A semantic problem in a domain file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{section} entry has an empty name")]
    EmptyName { section: &'static str },

    #[error("duplicate {section} name {name}")]
    DuplicateName { section: &'static str, name: String },

    #[error("server {server} belongs to unknown cluster {cluster}")]
    UnknownCluster { server: String, cluster: String },

    #[error("admin server {server} cannot belong to a cluster")]
    ClusteredAdminServer { server: String },

    #[error("{target} references unknown application {application}")]
    UnknownApplication { target: String, application: String },

    #[error("load balancer {load_balancer} uses unknown LB config {lb_config}")]
    UnknownLbConfig { load_balancer: String, lb_config: String },

    #[error("LB config {lb_config} references unknown {kind} {name}")]
    UnknownReferenceTarget {
        lb_config: String,
        kind: RefKind,
        name: String,
    },

    #[error("LB config {lb_config} references {server}, which is not a stand alone instance")]
    NotStandaloneInstance { lb_config: String, server: String },

    #[error("LB config {lb_config} references {kind} {name} more than once")]
    DuplicateReference {
        lb_config: String,
        kind: RefKind,
        name: String,
    },

    #[error("health checker default {field} must be greater than 0")]
    InvalidHealthCheckerDefault { field: &'static str },
}

/// Check a domain file for semantic errors.
pub fn validate_config(config: &DomainConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let clusters = unique_names(
        "cluster",
        config.clusters.iter().map(|c| c.name.as_str()),
        &mut errors,
    );
    let servers = unique_names(
        "server",
        config.servers.iter().map(|s| s.name.as_str()),
        &mut errors,
    );
    let applications = unique_names(
        "application",
        config.applications.iter().map(|a| a.name.as_str()),
        &mut errors,
    );
    unique_names(
        "load balancer",
        config.load_balancers.iter().map(|lb| lb.name.as_str()),
        &mut errors,
    );
    let lb_configs = unique_names(
        "LB config",
        config.lb_configs.iter().map(|c| c.name.as_str()),
        &mut errors,
    );

    // Standalone instances by name, for LB config server refs
    let mut standalone = HashMap::new();

    for server in &config.servers {
        if let Some(cluster) = &server.cluster {
            if server.admin {
                errors.push(ValidationError::ClusteredAdminServer {
                    server: server.name.clone(),
                });
            }
            if !clusters.contains(cluster.as_str()) {
                errors.push(ValidationError::UnknownCluster {
                    server: server.name.clone(),
                    cluster: cluster.clone(),
                });
            }
        }
        standalone.insert(server.name.as_str(), server.cluster.is_none() && !server.admin);
        check_application_refs(&server.name, &server.application_refs, &applications, &mut errors);
    }

    for cluster in &config.clusters {
        check_application_refs(
            &cluster.name,
            &cluster.application_refs,
            &applications,
            &mut errors,
        );
    }

    for lb in &config.load_balancers {
        if !lb_configs.contains(lb.lb_config_name.as_str()) {
            errors.push(ValidationError::UnknownLbConfig {
                load_balancer: lb.name.clone(),
                lb_config: lb.lb_config_name.clone(),
            });
        }
    }

    for lb_config in &config.lb_configs {
        let mut seen = HashSet::new();
        for r in &lb_config.refs {
            if !seen.insert((r.kind, r.name.as_str())) {
                errors.push(ValidationError::DuplicateReference {
                    lb_config: lb_config.name.clone(),
                    kind: r.kind,
                    name: r.name.clone(),
                });
            }
            let known = match r.kind {
                RefKind::Cluster => clusters.contains(r.name.as_str()),
                RefKind::Server => servers.contains(r.name.as_str()),
            };
            if !known {
                errors.push(ValidationError::UnknownReferenceTarget {
                    lb_config: lb_config.name.clone(),
                    kind: r.kind,
                    name: r.name.clone(),
                });
            } else if r.kind == RefKind::Server && standalone.get(r.name.as_str()) == Some(&false) {
                errors.push(ValidationError::NotStandaloneInstance {
                    lb_config: lb_config.name.clone(),
                    server: r.name.clone(),
                });
            }
        }
    }

    let defaults = &config.admin.health_checker;
    if defaults.interval_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheckerDefault { field: "interval_secs" });
    }
    if defaults.timeout_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheckerDefault { field: "timeout_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn unique_names<'a>(
    section: &'static str,
    names: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyName { section });
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateName {
                section,
                name: name.to_string(),
            });
        }
    }
    seen
}

fn check_application_refs(
    target: &str,
    refs: &[ApplicationRefConfig],
    applications: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    for r in refs {
        if !applications.contains(r.name.as_str()) {
            errors.push(ValidationError::UnknownApplication {
                target: target.to_string(),
                application: r.name.clone(),
            });
        }
    }
}
