//! `enable-http-lb-application`: let the load balancer route to an application.

use std::sync::Arc;

use crate::admin::params::Parameters;
use crate::admin::AdminCommand;
use crate::error::{AdminError, AdminResult, ObjectKind};
use crate::store::ConfigStore;
use crate::target::TargetResolver;

pub const NAME: &str = "enable-http-lb-application";

/// Sets `lb_enabled` on one application reference of a target.
///
/// Parameters: `target`, `name`.
pub struct EnableApplicationCommand {
    store: Arc<ConfigStore>,
}

impl EnableApplicationCommand {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }
}

impl AdminCommand for EnableApplicationCommand {
    fn name(&self) -> &'static str {
        NAME
    }

    fn execute(&self, params: &Parameters) -> AdminResult<String> {
        let target = params.require("target")?;
        let app = params.require("name")?;
        TargetResolver::new(&self.store).resolve(target)?;

        let app_ref = self
            .store
            .application_refs_in_target(target)
            .into_iter()
            .find(|r| r.name == app)
            .ok_or_else(|| {
                AdminError::not_found(ObjectKind::ApplicationRef, format!("{}/{}", target, app))
            })?;

        if !app_ref.node.snapshot().lb_enabled {
            self.store.mutator().apply(&app_ref.node, |tx| {
                tx.lb_enabled = true;
                Ok(())
            })?;
        }

        tracing::info!(
            target = %target,
            application = %app,
            "Enabled load balancing for application"
        );
        Ok(format!("Enabled application {} on {} for load balancing", app, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::parse_config;

    #[test]
    fn test_enable_application() {
        let config = parse_config(
            r#"
            [[clusters]]
            name = "cluster1"
            application_refs = [{ ref = "hello" }]

            [[applications]]
            name = "hello"
            "#,
        )
        .unwrap();
        let store = Arc::new(ConfigStore::from_config(&config));
        let command = EnableApplicationCommand::new(store.clone());

        let params = Parameters::new().with("target", "cluster1").with("name", "hello");
        command.execute(&params).unwrap();
        command.execute(&params).unwrap();

        let refs = store.application_refs_in_target("cluster1");
        assert!(refs[0].node.snapshot().lb_enabled);
        assert_eq!(refs[0].node.version(), 1);

        let err = command
            .execute(&Parameters::new().with("target", "cluster1").with("name", "bye"))
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound { kind: ObjectKind::ApplicationRef, .. }));

        let err = command
            .execute(&Parameters::new().with("target", "cluster9").with("name", "hello"))
            .unwrap_err();
        assert!(matches!(err, AdminError::NotFound { kind: ObjectKind::Target, .. }));
    }
}
