use std::sync::Arc;

use ndaflow_core::config::AppConfig;
use ndaflow_core::{IntegrationError, Notifier, TrackingSink};
use ndaflow_notify::{EmailNotifier, NotifyError};
use ndaflow_pandadoc::PandaDocClient;
use ndaflow_sheets::SheetsTrackingSink;
use thiserror::Error;
use tracing::info;

use crate::runtime::{AgentProfile, AgentRuntime};
use crate::tools::ToolRegistry;
use crate::workflow::NdaWorkflow;

pub struct Application {
    pub config: AppConfig,
    pub workflow: Arc<NdaWorkflow>,
    pub runtime: AgentRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("document provider setup failed: {0}")]
    Provider(#[source] IntegrationError),
    #[error("notifier setup failed: {0}")]
    Notifier(#[source] NotifyError),
}

impl Application {
    /// Missing sheets or SMTP settings degrade those components instead of
    /// failing; only the provider key is mandatory.
    pub fn from_config(config: AppConfig) -> Result<Self, BootstrapError> {
        let provider = PandaDocClient::new(&config.pandadoc).map_err(BootstrapError::Provider)?;
        let tracking = SheetsTrackingSink::from_config(&config.sheets);
        let notifier =
            EmailNotifier::from_config(&config.notification).map_err(BootstrapError::Notifier)?;

        info!(
            event_name = "system.bootstrap.components_ready",
            tracking_available = tracking.is_available(),
            notifications_enabled = notifier.is_enabled(),
            "components initialized"
        );

        let workflow =
            Arc::new(NdaWorkflow::new(Arc::new(provider), Arc::new(tracking), Arc::new(notifier)));
        let runtime = AgentRuntime::new(
            AgentProfile {
                name: config.agent.name.clone(),
                description: config.agent.description.clone(),
            },
            ToolRegistry::for_workflow(workflow.clone()),
        );

        Ok(Self { config, workflow, runtime })
    }
}

#[cfg(test)]
mod tests {
    use ndaflow_core::config::AppConfig;

    use super::{Application, BootstrapError};

    #[test]
    fn missing_api_key_fails_fast() {
        let result = Application::from_config(AppConfig::default());
        assert!(matches!(result, Err(BootstrapError::Provider(_))));
    }

    #[tokio::test]
    async fn optional_components_degrade_instead_of_failing() {
        let mut config = AppConfig::default();
        config.pandadoc.api_key = "test-key".to_string().into();
        config.pandadoc.base_url = "http://127.0.0.1:9".to_string();
        config.agent.name = "Legal Desk".to_string();

        let app = Application::from_config(config).expect("bootstrap with only an api key");

        assert_eq!(app.runtime.profile().name, "Legal Desk");
        assert_eq!(app.runtime.tools().len(), 12);
        let report = app.workflow.health_check().await;
        assert_eq!(report.tracking_sink.status, ndaflow_core::ComponentStatus::Unavailable);
        assert_eq!(report.notifier.status, ndaflow_core::ComponentStatus::Disabled);
        assert_eq!(report.overall, ndaflow_core::OverallStatus::Unhealthy);
    }
}
