//! Shared fixtures for integration tests.

use std::sync::{Arc, Mutex};

use lb_admin::admin::{AdminCommand, CommandService, CreateLbRef, Parameters};
use lb_admin::config::loader::parse_config;
use lb_admin::error::{AdminError, AdminResult};
use lb_admin::store::ConfigStore;

/// A domain with one cluster of two instances, one standalone instance, the
/// admin server, a user and a system application, and two LB configs.
pub const DOMAIN: &str = r#"
    [admin]
    log_level = "debug"

    [[clusters]]
    name = "cluster1"
    application_refs = [{ ref = "hello" }, { ref = "shop" }, { ref = "__admingui" }]

    [[servers]]
    name = "server"
    admin = true
    application_refs = [{ ref = "__admingui" }]

    [[servers]]
    name = "c1-inst1"
    cluster = "cluster1"

    [[servers]]
    name = "c1-inst2"
    cluster = "cluster1"

    [[servers]]
    name = "instance1"
    application_refs = [{ ref = "hello" }]

    [[applications]]
    name = "hello"

    [[applications]]
    name = "shop"

    [[applications]]
    name = "__admingui"
    object_type = "system"

    [[load_balancers]]
    name = "lb1"
    lb_config_name = "lb-config-1"

    [[lb_configs]]
    name = "lb-config-1"

    [[lb_configs]]
    name = "lb-config-2"
    refs = [{ kind = "cluster", ref = "cluster1", policy = "round-robin" }]
"#;

pub fn store() -> Arc<ConfigStore> {
    let config = parse_config(DOMAIN).unwrap();
    Arc::new(ConfigStore::from_config(&config))
}

/// The workflow over `store`, with `overrides` replacing the default
/// sub-commands of the same name.
pub fn create_lb_ref(store: &Arc<ConfigStore>, overrides: Vec<RecordingCommand>) -> CreateLbRef {
    let mut service = CommandService::with_defaults(store.clone());
    for command in overrides {
        service = service.register(command);
    }
    CreateLbRef::new(store.clone(), service.spawn())
}

/// A sub-command stand-in that records its invocations.
#[derive(Clone)]
pub struct RecordingCommand {
    name: &'static str,
    fail: bool,
    calls: Arc<Mutex<Vec<Parameters>>>,
}

#[allow(dead_code)]
impl RecordingCommand {
    pub fn succeeding(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            calls: Arc::default(),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::succeeding(name)
        }
    }

    pub fn calls(&self) -> Vec<Parameters> {
        self.calls.lock().unwrap().clone()
    }
}

impl AdminCommand for RecordingCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, params: &Parameters) -> AdminResult<String> {
        self.calls.lock().unwrap().push(params.clone());
        if self.fail {
            return Err(AdminError::invalid_parameter("target", "injected failure"));
        }
        Ok(format!("{} done", self.name))
    }
}
