//! The `create-http-lb-ref` workflow.
//!
//! # Responsibilities
//! - Validate the request and find the LB config
//! - Resolve the target and check it suits the request
//! - Add the cluster or server reference to the LB config
//! - Run the optional follow-on steps through the command service
//!
//! # Data Flow
//! ```text
//! CreateLbRefRequest
//!     → validate (config xor lbname) → resolve target → check target kind
//!     → RefCreator (one atomic apply on the LB config)
//!     → [create-http-health-checker]   via CommandRunner
//!     → [enable-http-lb-server]        via CommandRunner
//!     → [enable-http-lb-application]*  via CommandRunner, user apps only
//!     → [PolicyUpdater]                (one atomic apply on the cluster-ref)
//!     → ActionReport
//! ```
//!
//! # Design Decisions
//! - Every step commits on its own; a later failure never undoes an
//!   earlier step
//! - What a failure does is decided by `Step::failure_policy`, in one place
//! - Runs outside the command service so it can await sub-commands without
//!   blocking the service task

use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::admin::params::Parameters;
use crate::admin::report::ActionReport;
use crate::admin::runner::CommandRunner;
use crate::admin::steps::{FailurePolicy, Step};
use crate::admin::{enable_application, enable_server, health_checker};
use crate::config::HealthCheckerDefaults;
use crate::error::{AdminError, AdminResult, ObjectKind, TargetKindViolation};
use crate::load_balancer::{PolicyUpdater, RefCreator, RefOutcome};
use crate::observability::metrics;
use crate::store::{ConfigNode, ConfigStore, LbConfig};
use crate::target::{ResolvedTarget, TargetResolver};

pub const NAME: &str = "create-http-lb-ref";

/// Parameters of `create-http-lb-ref`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateLbRefRequest {
    /// Cluster or standalone instance to reference.
    pub target: String,
    /// LB config to add the reference to. Excludes `lb_name`.
    pub config: Option<String>,
    /// Load balancer whose LB config receives the reference. Excludes `config`.
    pub lb_name: Option<String>,
    pub policy: Option<String>,
    pub policy_module: Option<String>,
    pub health_checker_url: Option<String>,
    pub health_checker_interval: Option<String>,
    pub health_checker_timeout: Option<String>,
    pub enable_all_instances: bool,
    pub enable_all_applications: bool,
}

impl CreateLbRefRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    fn has_policy(&self) -> bool {
        self.policy.is_some() || self.policy_module.is_some()
    }
}

/// A fatal step failure.
#[derive(Debug)]
struct StepFailure {
    step: Step,
    error: AdminError,
}

/// Runs `create-http-lb-ref` against a store.
pub struct CreateLbRef {
    store: Arc<ConfigStore>,
    runner: CommandRunner,
    defaults: HealthCheckerDefaults,
}

impl CreateLbRef {
    pub fn new(store: Arc<ConfigStore>, runner: CommandRunner) -> Self {
        Self {
            store,
            runner,
            defaults: HealthCheckerDefaults::default(),
        }
    }

    /// Use `defaults` for health checker values the caller leaves out.
    pub fn with_health_checker_defaults(mut self, defaults: HealthCheckerDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Run the workflow. Never panics; every outcome is in the report.
    pub async fn execute(&self, request: &CreateLbRefRequest) -> ActionReport {
        let span = tracing::info_span!(
            "create_http_lb_ref",
            invocation = %Uuid::new_v4(),
            target = %request.target,
            config = ?request.config,
        );
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &CreateLbRefRequest) -> ActionReport {
        let mut report = ActionReport::new(NAME);
        match self.workflow(request, &mut report).await {
            Ok(message) => report.succeed(message),
            Err(StepFailure { step, error }) => {
                if error.is_validation() {
                    tracing::warn!(step = %step, error = %error, "Command rejected");
                } else {
                    tracing::error!(step = %step, error = %error, "Command failed");
                }
                report.fail(format!("{}: {}", step, error), Some(&error));
            }
        }
        metrics::record_command(NAME, report.is_success());
        report
    }

    async fn workflow(
        &self,
        request: &CreateLbRefRequest,
        report: &mut ActionReport,
    ) -> Result<String, StepFailure> {
        let config = fatal(Step::Validate, self.lb_config(request))?;
        let config_name = config.snapshot().name.clone();

        let resolver = TargetResolver::new(&self.store);
        let target = fatal(Step::ResolveTarget, resolver.resolve(&request.target))?;

        if request.has_policy() && !target.is_cluster() {
            let error =
                AdminError::invalid_target_kind(target.name(), TargetKindViolation::NotCluster);
            return fatal(Step::ValidateTargetKind, Err(error));
        }

        let creator = RefCreator::new(&self.store);
        let created = match &target {
            ResolvedTarget::Cluster(cluster) => creator.ensure_cluster_ref(&config, &cluster.name),
            ResolvedTarget::Server(server) => creator.ensure_server_ref(&config, &server.name),
        };
        let outcome = fatal(Step::CreateReference, created)?;

        if let Some(url) = &request.health_checker_url {
            let result = self.health_check(request, &config_name, &target, url).await;
            settle(Step::HealthCheck, result, report)?;
        }

        if request.enable_all_instances {
            let params = Parameters::new().with("target", target.name());
            let result = self.invoke(enable_server::NAME, params).await;
            settle(Step::EnableInstances, result, report)?;
        }

        if request.enable_all_applications || request.has_policy() {
            if request.enable_all_applications {
                self.enable_applications(target.name(), report).await?;
            }
            if request.has_policy() {
                let result = self.update_policy(&config, target.name(), request);
                settle(Step::UpdatePolicy, result, report)?;
            }
        }

        Ok(match outcome {
            RefOutcome::Created => format!(
                "Added {} {} to load balancer {}",
                target.kind(),
                target.name(),
                config_name
            ),
            RefOutcome::AlreadyPresent => format!(
                "{} {} is already referenced by load balancer {}",
                target.kind(),
                target.name(),
                config_name
            ),
        })
    }

    fn lb_config(&self, request: &CreateLbRefRequest) -> AdminResult<ConfigNode<LbConfig>> {
        let name = match (&request.config, &request.lb_name) {
            (Some(_), Some(_)) => return Err(AdminError::MutuallyExclusiveInput),
            (Some(config), None) => config.clone(),
            (None, Some(lb_name)) => self
                .store
                .load_balancer(lb_name)
                .map(|lb| lb.lb_config_name.clone())
                .ok_or_else(|| AdminError::not_found(ObjectKind::LoadBalancer, lb_name.as_str()))?,
            (None, None) => {
                return Err(AdminError::invalid_parameter(
                    "config",
                    "an LB config name or an LB name is required",
                ))
            }
        };
        self.store
            .lb_config(&name)
            .ok_or_else(|| AdminError::not_found(ObjectKind::LbConfig, name))
    }

    async fn health_check(
        &self,
        request: &CreateLbRefRequest,
        config: &str,
        target: &ResolvedTarget,
        url: &str,
    ) -> AdminResult<()> {
        let url = if url.trim().is_empty() { self.defaults.url.as_str() } else { url };
        let interval = request
            .health_checker_interval
            .clone()
            .unwrap_or_else(|| self.defaults.interval_secs.to_string());
        let timeout = request
            .health_checker_timeout
            .clone()
            .unwrap_or_else(|| self.defaults.timeout_secs.to_string());

        let params = Parameters::new()
            .with("config", config)
            .with("target", target.name())
            .with("kind", target.kind().to_string())
            .with("url", url)
            .with("interval", interval)
            .with("timeout", timeout);
        self.invoke(health_checker::NAME, params).await
    }

    /// Enable every user application deployed to `target`. A failure is
    /// recorded and the remaining applications are still enabled.
    async fn enable_applications(
        &self,
        target: &str,
        report: &mut ActionReport,
    ) -> Result<(), StepFailure> {
        for app in self.store.application_refs_in_target(target) {
            if !app.is_user_app() {
                tracing::debug!(application = %app.name, "Skipping system application");
                continue;
            }
            let params = Parameters::new().with("target", target).with("name", app.name.as_str());
            let result = self.invoke(enable_application::NAME, params).await;
            settle(Step::EnableApplications, result, report)?;
        }
        Ok(())
    }

    fn update_policy(
        &self,
        config: &ConfigNode<LbConfig>,
        target: &str,
        request: &CreateLbRefRequest,
    ) -> AdminResult<()> {
        let cluster_ref = config
            .snapshot()
            .cluster_ref(target)
            .cloned()
            .ok_or_else(|| AdminError::not_found(ObjectKind::ClusterRef, target))?;
        PolicyUpdater::new(self.store.mutator()).update_policy(
            &cluster_ref,
            request.policy.as_deref(),
            request.policy_module.as_deref(),
        )
    }

    async fn invoke(&self, command: &str, params: Parameters) -> AdminResult<()> {
        let report = self.runner.invoke(command, params).await;
        check_status(&report)
    }
}

/// Turn a failed sub-command report into an error.
fn check_status(report: &ActionReport) -> AdminResult<()> {
    if report.is_success() {
        return Ok(());
    }
    Err(AdminError::SubOperationFailure {
        command: report.command.clone(),
        message: report.message.clone(),
    })
}

/// Result of a step that always aborts the command on failure.
fn fatal<T>(step: Step, result: AdminResult<T>) -> Result<T, StepFailure> {
    debug_assert_eq!(step.failure_policy(), FailurePolicy::Fatal);
    result.map_err(|error| StepFailure { step, error })
}

/// Apply the failure policy of `step` to its result.
fn settle(
    step: Step,
    result: AdminResult<()>,
    report: &mut ActionReport,
) -> Result<(), StepFailure> {
    let error = match result {
        Ok(()) => return Ok(()),
        Err(error) => error,
    };
    match step.failure_policy() {
        FailurePolicy::Fatal => Err(StepFailure { step, error }),
        FailurePolicy::LogAndContinue => {
            tracing::warn!(step = %step, error = %error, "Step failed, continuing");
            report.warn(format!("{}: {}", step, error));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::CommandService;
    use crate::config::loader::parse_config;

    const DOMAIN: &str = r#"
        [[clusters]]
        name = "cluster1"

        [[servers]]
        name = "c1-inst1"
        cluster = "cluster1"

        [[servers]]
        name = "instance1"

        [[load_balancers]]
        name = "lb1"
        lb_config_name = "lb-config-1"

        [[lb_configs]]
        name = "lb-config-1"
    "#;

    fn command() -> (Arc<ConfigStore>, CreateLbRef) {
        let store = Arc::new(ConfigStore::from_config(&parse_config(DOMAIN).unwrap()));
        let runner = CommandService::with_defaults(store.clone()).spawn();
        (store.clone(), CreateLbRef::new(store, runner))
    }

    #[test]
    fn test_settle_follows_step_policy() {
        let mut report = ActionReport::new(NAME);
        let err = || Err(AdminError::not_found(ObjectKind::ClusterRef, "cluster1"));

        assert!(settle(Step::HealthCheck, err(), &mut report).is_ok());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("health-check: "));

        let failure = settle(Step::UpdatePolicy, err(), &mut report).unwrap_err();
        assert_eq!(failure.step, Step::UpdatePolicy);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_check_status() {
        let mut report = ActionReport::new("enable-http-lb-server");
        assert!(check_status(&report).is_ok());

        report.fail("boom", None);
        let err = check_status(&report).unwrap_err();
        assert_eq!(err.to_string(), "enable-http-lb-server failed: boom");
    }

    #[tokio::test]
    async fn test_lb_name_selects_config() {
        let (store, command) = command();
        let request = CreateLbRefRequest {
            lb_name: Some("lb1".into()),
            ..CreateLbRefRequest::new("instance1")
        };

        let report = command.execute(&request).await;
        assert!(report.is_success(), "{}", report.message);
        assert_eq!(report.message, "Added server instance1 to load balancer lb-config-1");
        let config = store.lb_config("lb-config-1").unwrap().snapshot();
        assert!(config.server_ref("instance1").is_some());
    }

    #[tokio::test]
    async fn test_missing_config_and_lb_name() {
        let (_, command) = command();
        let report = command.execute(&CreateLbRefRequest::new("cluster1")).await;
        assert!(!report.is_success());
        assert!(report.message.starts_with("validate: "));
    }

    #[tokio::test]
    async fn test_second_call_reports_existing_reference() {
        let (_, command) = command();
        let request = CreateLbRefRequest {
            config: Some("lb-config-1".into()),
            ..CreateLbRefRequest::new("cluster1")
        };

        assert!(command.execute(&request).await.is_success());
        let report = command.execute(&request).await;
        assert!(report.is_success());
        assert_eq!(
            report.message,
            "cluster cluster1 is already referenced by load balancer lb-config-1"
        );
    }

    #[tokio::test]
    async fn test_health_checker_defaults_fill_gaps() {
        let (store, command) = command();
        let command = command.with_health_checker_defaults(HealthCheckerDefaults {
            url: "/ping".into(),
            interval_secs: 7,
            timeout_secs: 3,
        });
        let request = CreateLbRefRequest {
            config: Some("lb-config-1".into()),
            health_checker_url: Some(String::new()),
            ..CreateLbRefRequest::new("cluster1")
        };

        let report = command.execute(&request).await;
        assert!(report.is_success());
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let config = store.lb_config("lb-config-1").unwrap().snapshot();
        let cluster_ref = config.cluster_ref("cluster1").unwrap().snapshot();
        let checker = cluster_ref.health_checker.as_ref().unwrap().snapshot();
        assert_eq!(checker.url, "/ping");
        assert_eq!(checker.interval_in_seconds, 7);
        assert_eq!(checker.timeout_in_seconds, 3);
    }
}
