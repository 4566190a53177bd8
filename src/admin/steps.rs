//! Steps of the `create-http-lb-ref` workflow and their failure policies.

use serde::Serialize;
use std::fmt;

/// What the workflow does when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Abort the command and report failure.
    Fatal,
    /// Record a warning and go on with the next step.
    LogAndContinue,
}

/// A workflow step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Validate,
    ResolveTarget,
    ValidateTargetKind,
    CreateReference,
    HealthCheck,
    EnableInstances,
    EnableApplications,
    UpdatePolicy,
}

impl Step {
    /// Every step, in the order the workflow visits them.
    pub const WORKFLOW: [Step; 8] = [
        Step::Validate,
        Step::ResolveTarget,
        Step::ValidateTargetKind,
        Step::CreateReference,
        Step::HealthCheck,
        Step::EnableInstances,
        Step::EnableApplications,
        Step::UpdatePolicy,
    ];

    pub const fn failure_policy(self) -> FailurePolicy {
        match self {
            Step::Validate
            | Step::ResolveTarget
            | Step::ValidateTargetKind
            | Step::CreateReference
            | Step::UpdatePolicy => FailurePolicy::Fatal,
            Step::HealthCheck | Step::EnableInstances | Step::EnableApplications => {
                FailurePolicy::LogAndContinue
            }
        }
    }

    /// Whether the step only runs when the caller asked for it.
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Step::HealthCheck
                | Step::EnableInstances
                | Step::EnableApplications
                | Step::UpdatePolicy
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Step::Validate => "validate",
            Step::ResolveTarget => "resolve-target",
            Step::ValidateTargetKind => "validate-target-kind",
            Step::CreateReference => "create-reference",
            Step::HealthCheck => "health-check",
            Step::EnableInstances => "enable-instances",
            Step::EnableApplications => "enable-applications",
            Step::UpdatePolicy => "update-policy",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_steps_are_fatal() {
        for step in Step::WORKFLOW.iter().filter(|s| !s.is_optional()) {
            assert_eq!(step.failure_policy(), FailurePolicy::Fatal, "{}", step);
        }
    }

    #[test]
    fn test_auxiliary_steps_continue() {
        assert_eq!(Step::HealthCheck.failure_policy(), FailurePolicy::LogAndContinue);
        assert_eq!(Step::EnableInstances.failure_policy(), FailurePolicy::LogAndContinue);
        assert_eq!(Step::EnableApplications.failure_policy(), FailurePolicy::LogAndContinue);
        // an explicitly requested policy must be confirmed
        assert_eq!(Step::UpdatePolicy.failure_policy(), FailurePolicy::Fatal);
    }

    #[test]
    fn test_reference_precedes_optional_steps() {
        let position = |step| Step::WORKFLOW.iter().position(|s| *s == step).unwrap();
        let create = position(Step::CreateReference);
        for step in Step::WORKFLOW.iter().filter(|s| s.is_optional()) {
            assert!(position(*step) > create, "{}", step);
        }
        assert_eq!(Step::WORKFLOW[0], Step::Validate);
        assert_eq!(Step::UpdatePolicy.to_string(), "update-policy");
    }
}
