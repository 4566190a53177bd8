//! Command execution service.
//!
//! # Responsibilities
//! - Hold the registry of named commands
//! - Execute requests received over a channel, one at a time
//! - Reply to each request with its `ActionReport`
//!
//! # Design Decisions
//! - Callers only hold a `CommandRunner` (a channel sender); they never see
//!   command objects
//! - An unknown command name or a stopped service is a failure report, not
//!   a panic

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::admin::params::Parameters;
use crate::admin::report::ActionReport;
use crate::admin::AdminCommand;
use crate::admin::{EnableApplicationCommand, EnableServerCommand, HealthCheckerCommand};
use crate::observability::metrics;
use crate::store::ConfigStore;

const CHANNEL_CAPACITY: usize = 64;

/// A request for the command service.
struct CommandRequest {
    name: String,
    params: Parameters,
    reply: oneshot::Sender<ActionReport>,
}

/// Registry of commands, run on its own task.
#[derive(Default)]
pub struct CommandService {
    commands: HashMap<&'static str, Arc<dyn AdminCommand>>,
}

impl CommandService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service with the sub-commands used by `create-http-lb-ref`.
    pub fn with_defaults(store: Arc<ConfigStore>) -> Self {
        Self::new()
            .register(HealthCheckerCommand::new(store.clone()))
            .register(EnableServerCommand::new(store.clone()))
            .register(EnableApplicationCommand::new(store))
    }

    /// Register a command, replacing any command with the same name.
    pub fn register(mut self, command: impl AdminCommand + 'static) -> Self {
        self.commands.insert(command.name(), Arc::new(command));
        self
    }

    /// Start the service on a Tokio task.
    pub fn spawn(self) -> CommandRunner {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(self.run(rx));
        CommandRunner { tx }
    }

    async fn run(self, mut rx: mpsc::Receiver<CommandRequest>) {
        tracing::debug!(commands = self.commands.len(), "Command service started");
        while let Some(request) = rx.recv().await {
            let report = self.dispatch(&request.name, &request.params);
            if request.reply.send(report).is_err() {
                tracing::debug!(command = %request.name, "Caller went away before the reply");
            }
        }
        tracing::debug!("Command service stopped");
    }

    fn dispatch(&self, name: &str, params: &Parameters) -> ActionReport {
        let mut report = ActionReport::new(name);
        match self.commands.get(name) {
            Some(command) => match command.execute(params) {
                Ok(message) => report.succeed(message),
                Err(e) => {
                    tracing::debug!(command = %name, error = %e, "Command failed");
                    report.fail(e.to_string(), Some(&e));
                }
            },
            None => report.fail(format!("Command {} not found", name), None),
        }
        metrics::record_command(name, report.is_success());
        report
    }
}

/// Handle used to invoke commands by name.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    tx: mpsc::Sender<CommandRequest>,
}

impl CommandRunner {
    /// Run `name` to completion and return its report.
    pub async fn invoke(&self, name: &str, params: Parameters) -> ActionReport {
        let (reply, response) = oneshot::channel();
        let request = CommandRequest {
            name: name.to_string(),
            params,
            reply,
        };

        if self.tx.send(request).await.is_err() {
            return unavailable(name);
        }
        response.await.unwrap_or_else(|_| unavailable(name))
    }
}

fn unavailable(name: &str) -> ActionReport {
    let mut report = ActionReport::new(name);
    report.fail("Command service is not running", None);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AdminError, AdminResult};

    struct Echo;

    impl AdminCommand for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn execute(&self, params: &Parameters) -> AdminResult<String> {
            Ok(params.require("text")?.to_string())
        }
    }

    #[tokio::test]
    async fn test_invoke_by_name() {
        let runner = CommandService::new().register(Echo).spawn();

        let report = runner.invoke("echo", Parameters::new().with("text", "hi")).await;
        assert!(report.is_success());
        assert_eq!(report.message, "hi");

        let report = runner.invoke("echo", Parameters::new()).await;
        assert!(!report.is_success());
        assert!(report.message.contains("text"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let runner = CommandService::new().spawn();
        let report = runner.invoke("no-such-command", Parameters::new()).await;
        assert!(!report.is_success());
        assert_eq!(report.message, "Command no-such-command not found");
    }

    #[tokio::test]
    async fn test_failure_cause_recorded() {
        struct Fails;
        impl AdminCommand for Fails {
            fn name(&self) -> &'static str {
                "fails"
            }
            fn execute(&self, _: &Parameters) -> AdminResult<String> {
                Err(AdminError::MutuallyExclusiveInput)
            }
        }

        let runner = CommandService::new().register(Fails).spawn();
        let report = runner.invoke("fails", Parameters::new()).await;
        assert_eq!(report.failure_cause.as_deref(), Some("MutuallyExclusiveInput"));
    }
}
