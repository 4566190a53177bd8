//! Target resolution.
//!
//! # Responsibilities
//! - Decide whether a name denotes a cluster or a server
//! - Report precisely which lookup failed
//!
//! # Design Decisions
//! - Cluster lookup first: a name that is both resolves as a cluster
//! - Pure lookup, no side effects

use std::sync::Arc;

use crate::error::{AdminError, AdminResult, ObjectKind};
use crate::store::{Cluster, ConfigStore, RefKind, Server};

/// A target resolved to exactly one kind.
#[derive(Debug, Clone)]
pub enum ResolvedTarget {
    Cluster(Arc<Cluster>),
    Server(Arc<Server>),
}

impl ResolvedTarget {
    pub fn name(&self) -> &str {
        match self {
            ResolvedTarget::Cluster(c) => &c.name,
            ResolvedTarget::Server(s) => &s.name,
        }
    }

    pub fn kind(&self) -> RefKind {
        match self {
            ResolvedTarget::Cluster(_) => RefKind::Cluster,
            ResolvedTarget::Server(_) => RefKind::Server,
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ResolvedTarget::Cluster(_))
    }
}

/// Looks up targets in the store.
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver<'a> {
    store: &'a ConfigStore,
}

impl<'a> TargetResolver<'a> {
    pub fn new(store: &'a ConfigStore) -> Self {
        Self { store }
    }

    /// Resolve `name` as a cluster, then as a server.
    pub fn resolve(&self, name: &str) -> AdminResult<ResolvedTarget> {
        if let Ok(cluster) = self.cluster(name) {
            return Ok(ResolvedTarget::Cluster(cluster));
        }
        match self.server(name) {
            Ok(server) => Ok(ResolvedTarget::Server(server)),
            Err(_) => Err(AdminError::not_found(ObjectKind::Target, name)),
        }
    }

    pub fn cluster(&self, name: &str) -> AdminResult<Arc<Cluster>> {
        self.store
            .cluster(name)
            .ok_or_else(|| AdminError::not_found(ObjectKind::Cluster, name))
    }

    pub fn server(&self, name: &str) -> AdminResult<Arc<Server>> {
        self.store
            .server(name)
            .ok_or_else(|| AdminError::not_found(ObjectKind::Server, name))
    }
}
