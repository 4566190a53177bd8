//! Error types for load balancer administration.

use std::fmt;
use thiserror::Error;

use crate::store::TransactionFailure;

/// Kind of configuration object a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    LoadBalancer,
    LbConfig,
    Cluster,
    Server,
    /// A name that is neither a cluster nor a server.
    Target,
    ClusterRef,
    ServerRef,
    ApplicationRef,
    HealthChecker,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::LoadBalancer => "load balancer",
            ObjectKind::LbConfig => "LB config",
            ObjectKind::Cluster => "cluster",
            ObjectKind::Server => "server",
            ObjectKind::Target => "target",
            ObjectKind::ClusterRef => "cluster-ref",
            ObjectKind::ServerRef => "server-ref",
            ObjectKind::ApplicationRef => "application-ref",
            ObjectKind::HealthChecker => "health-checker",
        };
        f.write_str(name)
    }
}

/// Why a target cannot be used for the requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKindViolation {
    /// Policy attributes were requested for a server.
    NotCluster,
    /// A server reference was requested for a clustered or admin server.
    NotStandaloneInstance,
}

/// Errors produced by the admin commands.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Both a load balancer name and an LB config name were supplied.
    #[error("Either LB name or LB config name, not both")]
    MutuallyExclusiveInput,

    /// A named object does not exist.
    #[error("Specified {kind} {name} does not exist")]
    NotFound { kind: ObjectKind, name: String },

    /// A named object already exists where a new one was requested.
    #[error("{kind} already exists for {name}")]
    AlreadyExists { kind: ObjectKind, name: String },

    /// The target is of the wrong kind for the operation.
    #[error("{}", describe_violation(name, *violation))]
    InvalidTargetKind {
        name: String,
        violation: TargetKindViolation,
    },

    /// A parameter is missing or cannot be parsed.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// An atomic apply was rejected.
    #[error(transparent)]
    Transaction(#[from] TransactionFailure),

    /// An invoked sub-command reported failure.
    #[error("{command} failed: {message}")]
    SubOperationFailure { command: String, message: String },
}

fn describe_violation(name: &str, violation: TargetKindViolation) -> String {
    match violation {
        TargetKindViolation::NotCluster => format!("{} not a cluster", name),
        TargetKindViolation::NotStandaloneInstance => format!(
            "[{}] is not a stand alone instance. \
             Only stand alone instance can be added to a load balancer.",
            name
        ),
    }
}

impl AdminError {
    pub fn not_found(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_target_kind(name: impl Into<String>, violation: TargetKindViolation) -> Self {
        Self::InvalidTargetKind {
            name: name.into(),
            violation,
        }
    }

    /// Validation errors abort a command before anything is mutated.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdminError::MutuallyExclusiveInput
                | AdminError::NotFound { .. }
                | AdminError::InvalidTargetKind { .. }
                | AdminError::InvalidParameter { .. }
        )
    }
}

/// Result type for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdminError::not_found(ObjectKind::LbConfig, "lb-config-9");
        assert_eq!(err.to_string(), "Specified LB config lb-config-9 does not exist");

        let err = AdminError::invalid_target_kind("instance1", TargetKindViolation::NotCluster);
        assert_eq!(err.to_string(), "instance1 not a cluster");

        let err =
            AdminError::invalid_target_kind("c1-inst1", TargetKindViolation::NotStandaloneInstance);
        assert!(err.to_string().starts_with("[c1-inst1] is not a stand alone instance"));
    }

    #[test]
    fn test_validation_classification() {
        assert!(AdminError::MutuallyExclusiveInput.is_validation());
        assert!(AdminError::not_found(ObjectKind::Target, "x").is_validation());
        let sub = AdminError::SubOperationFailure {
            command: "enable-http-lb-server".into(),
            message: "boom".into(),
        };
        assert!(!sub.is_validation());
    }
}
