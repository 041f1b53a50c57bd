//! NDA workflow orchestration over the three component ports.
//!
//! Create and send run the same sequence: one provider call decides the
//! outcome, then a tracking row and a notification are attempted in order.
//! Neither of those two can turn a completed provider call into a failure.

use std::path::Path;
use std::sync::Arc;

use chrono::{Local, Utc};
use ndaflow_core::{
    AuxiliaryOutcome, ComponentHealth, ComponentStatus, DocumentCreateRequest, DocumentDetails,
    DocumentId, DocumentList, DocumentOutcome, DocumentProvider, DocumentQuery, DocumentStatus,
    DocumentSummary, DownloadReceipt, HealthReport, IntegrationError, NdaRequest, Notification,
    Notifier, PrimaryOutcome, Recipient, SendRequest, SideEffect, TemplateDetails, TemplateId,
    TemplateList, TrackingAction, TrackingDetails, TrackingSink, TrackingStatistics,
    WorkflowResult,
};
use ndaflow_core::domain::document::DocumentRecipient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const RECENT_PROVIDER_DOCUMENTS: u32 = 10;
const UNKNOWN_TEMPLATE: &str = "Unknown";
const CREATED_NEXT_STEPS: &str = "Review the document and send it for signature";
const SENT_NEXT_STEPS: &str = "The recipient will receive an email with signing instructions";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdaStatistics {
    #[serde(flatten)]
    pub tracking: TrackingStatistics,
    pub recent_provider_documents: Vec<DocumentSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDocument {
    pub id: DocumentId,
    pub name: Option<String>,
    pub created: Option<String>,
    /// Who still has to sign, as listed by the provider.
    pub recipients: Vec<DocumentRecipient>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignatures {
    pub pending_count: usize,
    pub pending_documents: Vec<PendingDocument>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummaryOutcome {
    pub success: bool,
    pub statistics: NdaStatistics,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualLogOutcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Create followed by send. `sent` is `None` when creation failed and the
/// send was never attempted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAndSendResult {
    pub created: WorkflowResult,
    pub sent: Option<WorkflowResult>,
}

impl CreateAndSendResult {
    pub fn success(&self) -> bool {
        self.created.success() && self.sent.as_ref().is_some_and(WorkflowResult::success)
    }

    pub fn to_report(&self) -> Value {
        let mut report = json!({
            "success": self.success(),
            "created": self.created.to_report(),
        });
        if let Some(sent) = &self.sent {
            report["sent"] = sent.to_report();
        }
        report
    }
}

pub struct NdaWorkflow {
    provider: Arc<dyn DocumentProvider>,
    tracking: Arc<dyn TrackingSink>,
    notifier: Arc<dyn Notifier>,
}

impl NdaWorkflow {
    pub fn new(
        provider: Arc<dyn DocumentProvider>,
        tracking: Arc<dyn TrackingSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { provider, tracking, notifier }
    }

    pub async fn create_nda(&self, request: &NdaRequest) -> WorkflowResult {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "workflow.create.start",
            correlation_id = %correlation_id,
            template_id = %request.template_id,
            company = %request.company_name,
            "creating NDA workflow"
        );

        let date = Local::now().format("%Y-%m-%d").to_string();
        let create_request = DocumentCreateRequest::new(
            request.document_name(),
            request.template_id.clone(),
            vec![Recipient::from_full_name(&request.recipient_email, &request.recipient_name, None)],
            &request.tokens(&date),
        );

        let created = match self.provider.create_document(&create_request).await {
            Ok(created) => created,
            Err(create_error) => {
                error!(
                    event_name = "workflow.create.failed",
                    correlation_id = %correlation_id,
                    error = %create_error,
                    "document creation failed"
                );
                return WorkflowResult::failed(create_error.to_string());
            }
        };

        let document_name = created.name.clone();
        let template_name = document_name.clone().unwrap_or_else(|| UNKNOWN_TEMPLATE.to_string());
        let details = TrackingDetails {
            template_name: Some(template_name.clone()),
            recipient: Some(request.recipient_email.clone()),
            company: Some(request.company_name.clone()),
            status: Some("created".to_string()),
            ..TrackingDetails::default()
        };
        let auxiliary = self
            .record(
                &correlation_id,
                &TrackingAction::Created,
                &created.id,
                &details,
                Notification::DocumentCreated {
                    document_id: created.id.clone(),
                    template_name,
                    recipient: request.recipient_email.clone(),
                },
            )
            .await;

        info!(
            event_name = "workflow.create.completed",
            correlation_id = %correlation_id,
            document_id = %created.id,
            "NDA document created"
        );

        WorkflowResult {
            primary: PrimaryOutcome::Completed(DocumentOutcome {
                document_id: created.id,
                document_name,
                status: "created".to_string(),
                provider_status: created.status.unwrap_or(DocumentStatus::Draft),
                next_steps: CREATED_NEXT_STEPS.to_string(),
            }),
            auxiliary,
        }
    }

    pub async fn send_nda(&self, document_id: &DocumentId, send: &SendRequest) -> WorkflowResult {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "workflow.send.start",
            correlation_id = %correlation_id,
            document_id = %document_id,
            "sending NDA for signature"
        );

        let receipt = match self.provider.send_document(document_id, send).await {
            Ok(receipt) => receipt,
            Err(send_error) => {
                error!(
                    event_name = "workflow.send.failed",
                    correlation_id = %correlation_id,
                    document_id = %document_id,
                    error = %send_error,
                    "document send failed"
                );
                return WorkflowResult::failed(send_error.to_string());
            }
        };

        // Name and recipient only label the row and the email.
        let (document_name, recipient) = match self.provider.document_details(document_id).await {
            Ok(details) => describe(&details),
            Err(lookup_error) => {
                warn!(
                    event_name = "workflow.send.details_unavailable",
                    correlation_id = %correlation_id,
                    error = %lookup_error,
                    "could not fetch document details after send"
                );
                (None, String::new())
            }
        };
        let template_name = document_name.clone().unwrap_or_else(|| UNKNOWN_TEMPLATE.to_string());

        let details = TrackingDetails {
            template_name: Some(template_name.clone()),
            recipient: Some(recipient.clone()),
            status: Some("sent".to_string()),
            ..TrackingDetails::default()
        };
        let auxiliary = self
            .record(
                &correlation_id,
                &TrackingAction::Sent,
                document_id,
                &details,
                Notification::DocumentSent {
                    document_id: document_id.clone(),
                    template_name,
                    recipient,
                },
            )
            .await;

        WorkflowResult {
            primary: PrimaryOutcome::Completed(DocumentOutcome {
                document_id: receipt.document_id,
                document_name,
                status: "sent".to_string(),
                provider_status: receipt.status,
                next_steps: SENT_NEXT_STEPS.to_string(),
            }),
            auxiliary,
        }
    }

    pub async fn create_and_send(
        &self,
        request: &NdaRequest,
        send: &SendRequest,
    ) -> CreateAndSendResult {
        let created = self.create_nda(request).await;
        let Some(document_id) = created.document().map(|document| document.document_id.clone())
        else {
            return CreateAndSendResult { created, sent: None };
        };

        let sent = self.send_nda(&document_id, send).await;
        CreateAndSendResult { created, sent: Some(sent) }
    }

    pub async fn get_statistics(&self) -> NdaStatistics {
        info!(event_name = "workflow.statistics.start", "fetching NDA statistics");
        let tracking = self.tracking.statistics().await;
        let recent = self
            .provider
            .list_documents(&DocumentQuery::with_limit(RECENT_PROVIDER_DOCUMENTS))
            .await;

        NdaStatistics { tracking, recent_provider_documents: recent.results }
    }

    /// Documents the provider lists as sent whose current status is still
    /// `sent`. A document whose status lookup fails is left out.
    pub async fn check_pending_signatures(&self) -> PendingSignatures {
        info!(event_name = "workflow.pending.start", "checking for pending signatures");
        let sent = self.provider.list_documents(&DocumentQuery::with_status(DocumentStatus::Sent)).await;

        let mut pending_documents = Vec::new();
        for document in sent.results {
            match self.provider.document_status(&document.id).await {
                Ok(current) if current.status == Some(DocumentStatus::Sent) => {
                    pending_documents.push(PendingDocument {
                        id: document.id,
                        name: document.name,
                        created: document.date_created,
                        recipients: document.recipients,
                    });
                }
                Ok(_) => {}
                Err(lookup_error) => warn!(
                    event_name = "workflow.pending.status_failed",
                    document_id = %document.id,
                    error = %lookup_error,
                    "skipping document whose status could not be fetched"
                ),
            }
        }

        PendingSignatures { pending_count: pending_documents.len(), pending_documents }
    }

    pub async fn send_daily_summary(&self) -> DailySummaryOutcome {
        info!(event_name = "workflow.summary.start", "sending daily summary");
        let statistics = self.get_statistics().await;
        let success = self
            .notifier
            .notify(&Notification::DailySummary { statistics: statistics.tracking.clone() })
            .await;

        let message = if success {
            "Daily summary sent successfully"
        } else {
            "Failed to send daily summary"
        };
        DailySummaryOutcome { success, statistics, message: message.to_string() }
    }

    pub async fn log_manual_action(
        &self,
        action: &TrackingAction,
        document_id: &DocumentId,
        details: &TrackingDetails,
    ) -> ManualLogOutcome {
        info!(
            event_name = "workflow.manual_log.start",
            action = action.as_str(),
            document_id = %document_id,
            "logging manual action"
        );

        match self.tracking.log_action(action, document_id, details).await {
            Ok(()) => ManualLogOutcome {
                success: true,
                message: "Action logged successfully".to_string(),
                error: None,
            },
            Err(log_error) => ManualLogOutcome {
                success: false,
                message: "Failed to log action".to_string(),
                error: Some(log_error.to_string()),
            },
        }
    }

    pub async fn health_check(&self) -> HealthReport {
        info!(event_name = "workflow.health.start", "performing health check");

        let document_provider = match self.provider.list_templates().await {
            Ok(templates) => ComponentHealth::new(
                ComponentStatus::Healthy,
                format!("Found {} templates", templates.results.len()),
            ),
            Err(list_error) => ComponentHealth::new(ComponentStatus::Unhealthy, list_error.to_string()),
        };

        let tracking_sink = if self.tracking.is_available() {
            ComponentHealth::new(ComponentStatus::Healthy, "Service initialized")
        } else {
            ComponentHealth::new(ComponentStatus::Unavailable, "Service not initialized")
        };

        let notifier = if self.notifier.is_enabled() {
            ComponentHealth::new(ComponentStatus::Healthy, "Email notifications configured")
        } else {
            ComponentHealth::new(ComponentStatus::Disabled, "Email notifications not configured")
        };

        let report = HealthReport::from_components(
            document_provider,
            tracking_sink,
            notifier,
            Utc::now().to_rfc3339(),
        );
        info!(event_name = "workflow.health.completed", overall = report.overall.as_str());
        report
    }

    pub async fn list_templates(&self) -> Result<TemplateList, IntegrationError> {
        self.provider.list_templates().await
    }

    pub async fn template_details(
        &self,
        template_id: &TemplateId,
    ) -> Result<TemplateDetails, IntegrationError> {
        self.provider.template_details(template_id).await
    }

    pub async fn document_status(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentSummary, IntegrationError> {
        self.provider.document_status(document_id).await
    }

    pub async fn document_details(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentDetails, IntegrationError> {
        self.provider.document_details(document_id).await
    }

    pub async fn list_documents(&self, query: &DocumentQuery) -> DocumentList {
        self.provider.list_documents(query).await
    }

    pub async fn download_document(
        &self,
        document_id: &DocumentId,
        save_path: Option<&Path>,
    ) -> Result<DownloadReceipt, IntegrationError> {
        self.provider.download_document(document_id, save_path).await
    }

    async fn record(
        &self,
        correlation_id: &str,
        action: &TrackingAction,
        document_id: &DocumentId,
        details: &TrackingDetails,
        notification: Notification,
    ) -> AuxiliaryOutcome {
        let logged = match self.tracking.log_action(action, document_id, details).await {
            Ok(()) => SideEffect::Succeeded,
            Err(log_error) => {
                warn!(
                    event_name = "workflow.tracking.failed",
                    correlation_id = correlation_id,
                    document_id = %document_id,
                    error = %log_error,
                    "tracking row not written"
                );
                SideEffect::Failed(log_error.to_string())
            }
        };

        let notified = if self.notifier.is_enabled() {
            SideEffect::from_bool(
                self.notifier.notify(&notification).await,
                "notification delivery failed",
            )
        } else {
            SideEffect::Skipped
        };
        if let SideEffect::Failed(reason) = &notified {
            warn!(
                event_name = "workflow.notify.failed",
                correlation_id = correlation_id,
                kind = notification.kind(),
                reason = %reason,
                "notification not delivered"
            );
        }

        AuxiliaryOutcome { logged, notified }
    }
}

fn describe(details: &DocumentDetails) -> (Option<String>, String) {
    let recipient =
        details.recipients.first().map(|recipient| recipient.email.clone()).unwrap_or_default();
    (details.name.clone(), recipient)
}
