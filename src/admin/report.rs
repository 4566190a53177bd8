//! Outcome of an admin command.

use serde::Serialize;

use crate::error::AdminError;

/// Exit status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExitCode {
    Success,
    Failure,
}

/// Status and message recorded by a command.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub command: String,
    pub exit_code: ExitCode,
    pub message: String,
    /// Non-fatal step failures, in order of occurrence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_cause: Option<String>,
}

impl ActionReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            exit_code: ExitCode::Success,
            message: String::new(),
            warnings: Vec::new(),
            failure_cause: None,
        }
    }

    pub fn succeed(&mut self, message: impl Into<String>) {
        self.exit_code = ExitCode::Success;
        self.message = message.into();
    }

    /// Mark the command failed with `message`; `error` becomes the cause.
    pub fn fail(&mut self, message: impl Into<String>, error: Option<&AdminError>) {
        self.exit_code = ExitCode::Failure;
        self.message = message.into();
        self.failure_cause = error.map(|e| format!("{:?}", e));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == ExitCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail_report() {
        let mut report = ActionReport::new("create-http-lb-ref");
        report.warn("health-check: boom");
        report.succeed("done");
        assert!(report.is_success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["exit_code"], "SUCCESS");
        assert_eq!(json["warnings"][0], "health-check: boom");
        assert!(json.get("failure_cause").is_none());
    }

    #[test]
    fn test_fail_records_cause() {
        let mut report = ActionReport::new("create-http-lb-ref");
        report.fail(
            "validate: Either LB name or LB config name, not both",
            Some(&AdminError::MutuallyExclusiveInput),
        );
        assert!(!report.is_success());
        assert_eq!(report.failure_cause.as_deref(), Some("MutuallyExclusiveInput"));
        assert_eq!(serde_json::to_value(report.exit_code).unwrap(), "FAILURE");
    }
}
