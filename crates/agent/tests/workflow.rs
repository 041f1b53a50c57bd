use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndaflow_agent::{AgentProfile, AgentRuntime, NdaWorkflow, ToolRegistry};
use ndaflow_core::domain::document::DocumentRecipient;
use ndaflow_core::{
    ComponentStatus, CreatedDocument, DocumentCreateRequest, DocumentDetails, DocumentId,
    DocumentList, DocumentProvider, DocumentQuery, DocumentStatus,
    DocumentSummary, DownloadReceipt, IntegrationError, NdaRequest, Notification, Notifier,
    OverallStatus, SendReceipt, SendRequest, SideEffect, TemplateDetails, TemplateId,
    TemplateList, TemplateSummary, TrackingAction, TrackingDetails, TrackingSink,
    TrackingStatistics,
};

fn upstream(status: u16, body: &str) -> IntegrationError {
    IntegrationError::Status { service: "pandadoc", status, body: body.to_string() }
}

fn summary(id: &str, status: DocumentStatus) -> DocumentSummary {
    DocumentSummary {
        id: DocumentId(id.to_string()),
        name: Some(format!("NDA {id}")),
        status: Some(status),
        date_created: Some("2026-10-01T00:00:00Z".to_string()),
        date_modified: None,
        expiration_date: None,
        recipients: vec![jane()],
    }
}

fn jane() -> DocumentRecipient {
    DocumentRecipient {
        email: "jane@acme.test".to_string(),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        role: Some("signer".to_string()),
        has_completed: Some(false),
    }
}

struct FakeProvider {
    create: Result<CreatedDocument, IntegrationError>,
    send: Result<SendReceipt, IntegrationError>,
    templates: Result<TemplateList, IntegrationError>,
    documents: Vec<DocumentSummary>,
    statuses: HashMap<String, Result<DocumentStatus, IntegrationError>>,
    create_requests: Mutex<Vec<DocumentCreateRequest>>,
    queries: Mutex<Vec<DocumentQuery>>,
    sends: Mutex<Vec<DocumentId>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            create: Ok(CreatedDocument {
                id: DocumentId("doc-789".to_string()),
                name: Some("NDA - Acme Corp - Jane Doe".to_string()),
                status: Some(DocumentStatus::Uploaded),
                date_created: None,
            }),
            send: Ok(SendReceipt {
                document_id: DocumentId("doc-789".to_string()),
                status: DocumentStatus::Sent,
            }),
            templates: Ok(TemplateList {
                results: vec![TemplateSummary {
                    id: TemplateId("tmpl-123".to_string()),
                    name: "Mutual NDA".to_string(),
                    date_created: None,
                    date_modified: None,
                    version: None,
                }],
            }),
            documents: Vec::new(),
            statuses: HashMap::new(),
            create_requests: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            sends: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentProvider for FakeProvider {
    async fn list_templates(&self) -> Result<TemplateList, IntegrationError> {
        self.templates.clone()
    }

    async fn template_details(
        &self,
        template_id: &TemplateId,
    ) -> Result<TemplateDetails, IntegrationError> {
        Ok(TemplateDetails {
            id: template_id.clone(),
            name: "Mutual NDA".to_string(),
            fields: Vec::new(),
            roles: Vec::new(),
        })
    }

    async fn create_document(
        &self,
        request: &DocumentCreateRequest,
    ) -> Result<CreatedDocument, IntegrationError> {
        self.create_requests.lock().expect("lock").push(request.clone());
        self.create.clone()
    }

    async fn send_document(
        &self,
        document_id: &DocumentId,
        _request: &SendRequest,
    ) -> Result<SendReceipt, IntegrationError> {
        self.sends.lock().expect("lock").push(document_id.clone());
        self.send.clone()
    }

    async fn document_status(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentSummary, IntegrationError> {
        match self.statuses.get(&document_id.0) {
            Some(Ok(status)) => Ok(summary(&document_id.0, status.clone())),
            Some(Err(error)) => Err(error.clone()),
            None => Err(upstream(404, "not found")),
        }
    }

    async fn document_details(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentDetails, IntegrationError> {
        Ok(DocumentDetails {
            id: document_id.clone(),
            name: Some("NDA - Acme Corp - Jane Doe".to_string()),
            status: Some(DocumentStatus::Sent),
            date_created: None,
            date_modified: None,
            recipients: vec![jane()],
            tokens: Vec::new(),
        })
    }

    async fn list_documents(&self, query: &DocumentQuery) -> DocumentList {
        self.queries.lock().expect("lock").push(query.clone());
        DocumentList::from_results(self.documents.clone())
    }

    async fn download_document(
        &self,
        document_id: &DocumentId,
        save_path: Option<&Path>,
    ) -> Result<DownloadReceipt, IntegrationError> {
        Ok(DownloadReceipt {
            document_id: document_id.clone(),
            file_path: save_path.map(Path::to_path_buf).unwrap_or_default(),
            file_size: 0,
        })
    }
}

#[derive(Default)]
struct FakeSink {
    unavailable: bool,
    fail: bool,
    statistics: TrackingStatistics,
    rows: Mutex<Vec<(TrackingAction, DocumentId, TrackingDetails)>>,
}

#[async_trait]
impl TrackingSink for FakeSink {
    fn is_available(&self) -> bool {
        !self.unavailable
    }

    async fn log_action(
        &self,
        action: &TrackingAction,
        document_id: &DocumentId,
        details: &TrackingDetails,
    ) -> Result<(), IntegrationError> {
        self.rows.lock().expect("lock").push((action.clone(), document_id.clone(), details.clone()));
        if self.fail {
            return Err(IntegrationError::Transport {
                service: "google sheets",
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }

    async fn statistics(&self) -> TrackingStatistics {
        self.statistics.clone()
    }
}

struct FakeNotifier {
    enabled: bool,
    delivers: bool,
    sent: Mutex<Vec<Notification>>,
}

impl FakeNotifier {
    fn enabled() -> Self {
        Self { enabled: true, delivers: true, sent: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn notify(&self, notification: &Notification) -> bool {
        self.sent.lock().expect("lock").push(notification.clone());
        self.enabled && self.delivers
    }
}

struct Harness {
    provider: Arc<FakeProvider>,
    sink: Arc<FakeSink>,
    notifier: Arc<FakeNotifier>,
    workflow: Arc<NdaWorkflow>,
}

fn harness(provider: FakeProvider, sink: FakeSink, notifier: FakeNotifier) -> Harness {
    let provider = Arc::new(provider);
    let sink = Arc::new(sink);
    let notifier = Arc::new(notifier);
    let workflow = Arc::new(NdaWorkflow::new(provider.clone(), sink.clone(), notifier.clone()));
    Harness { provider, sink, notifier, workflow }
}

fn jane_request() -> NdaRequest {
    NdaRequest {
        template_id: TemplateId("tmpl-123".to_string()),
        recipient_email: "jane@acme.test".to_string(),
        recipient_name: "Jane Doe".to_string(),
        company_name: "Acme Corp".to_string(),
        additional_fields: BTreeMap::new(),
    }
}

#[tokio::test]
async fn create_logs_one_row_and_sends_one_notification() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());

    let result = h.workflow.create_nda(&jane_request()).await;

    assert!(result.success());
    assert_eq!(result.auxiliary.logged, SideEffect::Succeeded);
    assert_eq!(result.auxiliary.notified, SideEffect::Succeeded);
    assert_eq!(result.document().map(|doc| doc.document_id.0.as_str()), Some("doc-789"));
    assert_eq!(result.to_report()["status"], "created");

    let requests = h.provider.create_requests.lock().expect("lock");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].name, "NDA - Acme Corp - Jane Doe");
    assert_eq!(requests[0].recipients[0].first_name, "Jane");
    assert_eq!(requests[0].recipients[0].last_name, "Doe");
    assert_eq!(requests[0].recipients[0].role, "signer");
    let token_names: Vec<&str> = requests[0].tokens.iter().map(|token| token.name.as_str()).collect();
    assert_eq!(token_names, vec!["company_name", "date", "recipient_name"]);

    let rows = h.sink.rows.lock().expect("lock");
    assert_eq!(rows.len(), 1);
    let (action, document_id, details) = &rows[0];
    assert_eq!(action, &TrackingAction::Created);
    assert_eq!(document_id.0, "doc-789");
    assert_eq!(details.recipient.as_deref(), Some("jane@acme.test"));
    assert_eq!(details.status.as_deref(), Some("created"));
    assert_eq!(details.company.as_deref(), Some("Acme Corp"));

    let sent = h.notifier.sent.lock().expect("lock");
    assert_eq!(sent.len(), 1);
    assert!(matches!(
        &sent[0],
        Notification::DocumentCreated { document_id, recipient, .. }
            if document_id.0 == "doc-789" && recipient == "jane@acme.test"
    ));
}

#[tokio::test]
async fn create_failure_has_no_side_effects_and_keeps_the_message() {
    let provider = FakeProvider {
        create: Err(upstream(400, "template tmpl-123 not found")),
        ..FakeProvider::default()
    };
    let h = harness(provider, FakeSink::default(), FakeNotifier::enabled());

    let result = h.workflow.create_nda(&jane_request()).await;

    assert!(!result.success());
    assert_eq!(result.error(), Some("pandadoc returned HTTP 400: template tmpl-123 not found"));
    assert!(h.sink.rows.lock().expect("lock").is_empty());
    assert!(h.notifier.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn logging_and_notification_failures_do_not_fail_the_workflow() {
    let sink = FakeSink { fail: true, ..FakeSink::default() };
    let notifier = FakeNotifier { delivers: false, ..FakeNotifier::enabled() };
    let h = harness(FakeProvider::default(), sink, notifier);

    let result = h.workflow.create_nda(&jane_request()).await;

    assert!(result.success());
    assert!(matches!(result.auxiliary.logged, SideEffect::Failed(ref reason) if reason.contains("connection reset")));
    assert!(matches!(result.auxiliary.notified, SideEffect::Failed(_)));
    assert_eq!(result.to_report()["success"], true);
}

#[tokio::test]
async fn disabled_notifier_is_skipped() {
    let notifier = FakeNotifier { enabled: false, ..FakeNotifier::enabled() };
    let h = harness(FakeProvider::default(), FakeSink::default(), notifier);

    let result = h.workflow.create_nda(&jane_request()).await;

    assert_eq!(result.auxiliary.notified, SideEffect::Skipped);
    assert!(h.notifier.sent.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn send_logs_a_sent_row_labelled_from_document_details() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());

    let result = h
        .workflow
        .send_nda(&DocumentId("doc-789".to_string()), &SendRequest::with_message("Please sign"))
        .await;

    assert!(result.success());
    assert_eq!(
        result.document().map(|doc| doc.provider_status.clone()),
        Some(DocumentStatus::Sent)
    );
    assert_eq!(result.to_report()["status"], "sent");
    let rows = h.sink.rows.lock().expect("lock");
    assert_eq!(rows[0].0, TrackingAction::Sent);
    assert_eq!(rows[0].2.template_name.as_deref(), Some("NDA - Acme Corp - Jane Doe"));
    assert_eq!(rows[0].2.recipient.as_deref(), Some("jane@acme.test"));
    assert!(matches!(h.notifier.sent.lock().expect("lock")[0], Notification::DocumentSent { .. }));
}

#[tokio::test]
async fn create_and_send_reports_created_document_when_send_fails() {
    let provider =
        FakeProvider { send: Err(upstream(409, "document not ready")), ..FakeProvider::default() };
    let h = harness(provider, FakeSink::default(), FakeNotifier::enabled());

    let result =
        h.workflow.create_and_send(&jane_request(), &SendRequest::with_message("Please sign")).await;

    assert!(!result.success());
    assert!(result.created.success());
    let sent = result.sent.as_ref().expect("send was attempted");
    assert!(sent.error().is_some_and(|error| error.contains("document not ready")));
    let report = result.to_report();
    assert_eq!(report["created"]["document_id"], "doc-789");
    assert_eq!(report["sent"]["success"], false);
    assert_eq!(h.sink.rows.lock().expect("lock").len(), 1, "only the created row");
}

#[tokio::test]
async fn create_and_send_skips_send_when_create_fails() {
    let provider = FakeProvider { create: Err(upstream(500, "boom")), ..FakeProvider::default() };
    let h = harness(provider, FakeSink::default(), FakeNotifier::enabled());

    let result = h.workflow.create_and_send(&jane_request(), &SendRequest::with_message("x")).await;

    assert!(result.sent.is_none());
    assert!(h.provider.sends.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn health_is_partial_when_sink_uninitialized_and_notifier_disabled() {
    let sink = FakeSink { unavailable: true, ..FakeSink::default() };
    let notifier = FakeNotifier { enabled: false, ..FakeNotifier::enabled() };
    let h = harness(FakeProvider::default(), sink, notifier);

    let report = h.workflow.health_check().await;

    assert_eq!(report.document_provider.status, ComponentStatus::Healthy);
    assert_eq!(report.document_provider.details, "Found 1 templates");
    assert_eq!(report.tracking_sink.status, ComponentStatus::Unavailable);
    assert_eq!(report.notifier.status, ComponentStatus::Disabled);
    assert_eq!(report.overall, OverallStatus::PartiallyHealthy);
}

#[tokio::test]
async fn health_is_unhealthy_when_template_listing_fails() {
    let provider =
        FakeProvider { templates: Err(upstream(401, "invalid api key")), ..FakeProvider::default() };
    let h = harness(provider, FakeSink::default(), FakeNotifier::enabled());

    let report = h.workflow.health_check().await;

    assert_eq!(report.document_provider.status, ComponentStatus::Unhealthy);
    assert_eq!(report.overall, OverallStatus::Unhealthy);
}

#[tokio::test]
async fn statistics_attach_ten_recent_provider_documents() {
    let provider = FakeProvider {
        documents: vec![summary("doc-1", DocumentStatus::Sent)],
        ..FakeProvider::default()
    };
    let sink = FakeSink {
        statistics: TrackingStatistics { total_documents: 3, ..TrackingStatistics::default() },
        ..FakeSink::default()
    };
    let h = harness(provider, sink, FakeNotifier::enabled());

    let stats = h.workflow.get_statistics().await;

    assert_eq!(stats.tracking.total_documents, 3);
    assert_eq!(stats.recent_provider_documents.len(), 1);
    let queries = h.provider.queries.lock().expect("lock");
    assert_eq!(queries[0].limit, 10);
    assert_eq!(queries[0].status, None);

    let value = serde_json::to_value(&stats).expect("serialize");
    assert_eq!(value["total_documents"], 3);
    assert!(value["recent_provider_documents"].is_array());
}

#[tokio::test]
async fn pending_signatures_keep_only_documents_still_sent() {
    let provider = FakeProvider {
        documents: vec![
            summary("doc-1", DocumentStatus::Sent),
            summary("doc-2", DocumentStatus::Sent),
            summary("doc-3", DocumentStatus::Sent),
        ],
        statuses: HashMap::from([
            ("doc-1".to_string(), Ok(DocumentStatus::Sent)),
            ("doc-2".to_string(), Ok(DocumentStatus::Completed)),
            ("doc-3".to_string(), Err(upstream(503, "unavailable"))),
        ]),
        ..FakeProvider::default()
    };
    let h = harness(provider, FakeSink::default(), FakeNotifier::enabled());

    let pending = h.workflow.check_pending_signatures().await;

    assert_eq!(pending.pending_count, 1);
    assert_eq!(pending.pending_documents[0].id.0, "doc-1");
    assert_eq!(pending.pending_documents[0].recipients, vec![jane()]);
    let queries = h.provider.queries.lock().expect("lock");
    assert_eq!(queries[0].status, Some(DocumentStatus::Sent));
    assert_eq!(queries[0].limit, 100);
}

#[tokio::test]
async fn daily_summary_reports_delivery_outcome() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());
    let outcome = h.workflow.send_daily_summary().await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Daily summary sent successfully");
    assert!(matches!(h.notifier.sent.lock().expect("lock")[0], Notification::DailySummary { .. }));

    let notifier = FakeNotifier { enabled: false, ..FakeNotifier::enabled() };
    let h = harness(FakeProvider::default(), FakeSink::default(), notifier);
    let outcome = h.workflow.send_daily_summary().await;
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Failed to send daily summary");
}

#[tokio::test]
async fn manual_log_reports_sink_failure() {
    let sink = FakeSink { fail: true, ..FakeSink::default() };
    let h = harness(FakeProvider::default(), sink, FakeNotifier::enabled());

    let outcome = h
        .workflow
        .log_manual_action(
            &TrackingAction::Signed,
            &DocumentId("doc-1".to_string()),
            &TrackingDetails { status: Some("completed".to_string()), ..TrackingDetails::default() },
        )
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.message, "Failed to log action");
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn registry_dispatches_create_with_json_input() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());
    let registry = ToolRegistry::for_workflow(h.workflow.clone());

    let output = registry
        .execute(
            "create_nda",
            serde_json::json!({
                "template_id": "tmpl-123",
                "recipient_email": "jane@acme.test",
                "recipient_name": "Jane Doe",
                "company_name": "Acme Corp",
                "additional_fields": {"jurisdiction": "Delaware"}
            }),
        )
        .await
        .expect("tool runs");

    assert_eq!(output["success"], true);
    assert_eq!(output["document_id"], "doc-789");
    let requests = h.provider.create_requests.lock().expect("lock");
    assert!(requests[0].tokens.iter().any(|token| token.name == "jurisdiction"));
}

#[tokio::test]
async fn registry_rejects_unknown_tools_and_bad_input() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());
    let registry = ToolRegistry::for_workflow(h.workflow.clone());

    assert!(registry.execute("delete_everything", serde_json::json!({})).await.is_err());
    let error = registry
        .execute("send_document", serde_json::json!({}))
        .await
        .expect_err("document_id is required");
    assert!(error.to_string().contains("send_document"));
}

#[tokio::test]
async fn registry_rejects_create_message_without_send() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());
    let registry = ToolRegistry::for_workflow(h.workflow.clone());

    let error = registry
        .execute(
            "create_nda",
            serde_json::json!({
                "template_id": "tmpl-123",
                "recipient_email": "jane@acme.test",
                "recipient_name": "Jane Doe",
                "company_name": "Acme Corp",
                "message": "Please sign"
            }),
        )
        .await
        .expect_err("message without send is rejected");

    assert!(error.to_string().contains("`message` requires `send`"));
    assert!(h.provider.create_requests.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn runtime_turns_text_into_a_workflow_call() {
    let h = harness(FakeProvider::default(), FakeSink::default(), FakeNotifier::enabled());
    let runtime = AgentRuntime::new(
        AgentProfile { name: "NDA Agent".to_string(), description: "NDA desk".to_string() },
        ToolRegistry::for_workflow(h.workflow.clone()),
    );

    let reply = runtime
        .handle_message("Create an NDA for Jane Doe at Acme Corp, jane@acme.test, template tmpl-123")
        .await;
    assert!(reply.starts_with("create_nda:"), "{reply}");
    assert!(reply.contains("doc-789"));
    assert_eq!(h.sink.rows.lock().expect("lock").len(), 1);

    let clarification = runtime.handle_message("send it").await;
    assert!(clarification.contains("Which document?"));

    let help = runtime.handle_message("help").await;
    assert!(help.starts_with("NDA Agent - NDA desk"));
    assert!(help.contains("create_nda"));
}

#[tokio::test]
async fn runtime_renders_tool_errors_as_text() {
    let provider =
        FakeProvider { templates: Err(upstream(401, "invalid api key")), ..FakeProvider::default() };
    let h = harness(provider, FakeSink::default(), FakeNotifier::enabled());
    let runtime = AgentRuntime::new(
        AgentProfile { name: "NDA Agent".to_string(), description: "NDA desk".to_string() },
        ToolRegistry::for_workflow(h.workflow.clone()),
    );

    let reply = runtime.handle_message("list templates").await;
    assert!(reply.starts_with("list_templates failed:"), "{reply}");
    assert!(reply.contains("invalid api key"));
}
