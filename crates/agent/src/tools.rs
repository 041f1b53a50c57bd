use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use ndaflow_core::domain::document::DEFAULT_LIST_LIMIT;
use ndaflow_core::{
    DocumentId, DocumentQuery, DocumentStatus, NdaRequest, SendRequest, TemplateId,
    TrackingAction, TrackingDetails,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::workflow::NdaWorkflow;

const DEFAULT_SEND_MESSAGE: &str = "Please review and sign this NDA.";

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: Value) -> Result<Value>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with one tool per orchestrator and provider operation.
    pub fn for_workflow(workflow: Arc<NdaWorkflow>) -> Self {
        let mut registry = Self::default();
        for operation in WorkflowOperation::ALL {
            registry.register(WorkflowTool { operation, workflow: workflow.clone() });
        }
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| anyhow!("unknown tool `{name}`"))?;
        tool.execute(input).await
    }

    /// `(name, description)` pairs sorted by name.
    pub fn catalog(&self) -> Vec<(&'static str, &'static str)> {
        let mut entries: Vec<_> =
            self.tools.values().map(|tool| (tool.name(), tool.description())).collect();
        entries.sort_unstable();
        entries
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WorkflowOperation {
    ListTemplates,
    TemplateDetails,
    CreateNda,
    SendDocument,
    DocumentStatus,
    ListDocuments,
    DownloadDocument,
    Statistics,
    PendingSignatures,
    DailySummary,
    LogAction,
    HealthCheck,
}

impl WorkflowOperation {
    const ALL: [Self; 12] = [
        Self::ListTemplates,
        Self::TemplateDetails,
        Self::CreateNda,
        Self::SendDocument,
        Self::DocumentStatus,
        Self::ListDocuments,
        Self::DownloadDocument,
        Self::Statistics,
        Self::PendingSignatures,
        Self::DailySummary,
        Self::LogAction,
        Self::HealthCheck,
    ];
}

struct WorkflowTool {
    operation: WorkflowOperation,
    workflow: Arc<NdaWorkflow>,
}

#[derive(Debug, Deserialize)]
struct TemplateInput {
    template_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateInput {
    #[serde(flatten)]
    request: NdaRequest,
    #[serde(default)]
    send: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentInput {
    document_id: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: bool,
    #[serde(default)]
    output: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ListInput {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LogInput {
    action: String,
    document_id: String,
    #[serde(default)]
    details: TrackingDetails,
}

fn parse<T>(tool: &str, input: Value) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value(input).with_context(|| format!("invalid input for `{tool}`"))
}

#[async_trait]
impl Tool for WorkflowTool {
    fn name(&self) -> &'static str {
        match self.operation {
            WorkflowOperation::ListTemplates => "list_templates",
            WorkflowOperation::TemplateDetails => "template_details",
            WorkflowOperation::CreateNda => "create_nda",
            WorkflowOperation::SendDocument => "send_document",
            WorkflowOperation::DocumentStatus => "document_status",
            WorkflowOperation::ListDocuments => "list_documents",
            WorkflowOperation::DownloadDocument => "download_document",
            WorkflowOperation::Statistics => "get_statistics",
            WorkflowOperation::PendingSignatures => "check_pending_signatures",
            WorkflowOperation::DailySummary => "send_daily_summary",
            WorkflowOperation::LogAction => "log_manual_action",
            WorkflowOperation::HealthCheck => "health_check",
        }
    }

    fn description(&self) -> &'static str {
        match self.operation {
            WorkflowOperation::ListTemplates => "List the available NDA templates",
            WorkflowOperation::TemplateDetails => "Show a template's fields and roles",
            WorkflowOperation::CreateNda => "Create an NDA from a template, optionally sending it",
            WorkflowOperation::SendDocument => "Send a document for signature",
            WorkflowOperation::DocumentStatus => "Show a document's status or full details",
            WorkflowOperation::ListDocuments => "List documents, optionally filtered by status",
            WorkflowOperation::DownloadDocument => "Download a document as PDF",
            WorkflowOperation::Statistics => "NDA statistics and recent activity",
            WorkflowOperation::PendingSignatures => "Documents still waiting for a signature",
            WorkflowOperation::DailySummary => "Email the daily NDA summary",
            WorkflowOperation::LogAction => "Record a manual action in the tracking sheet",
            WorkflowOperation::HealthCheck => "Check every integration",
        }
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let name = self.name();
        let workflow = &self.workflow;

        let output = match self.operation {
            WorkflowOperation::ListTemplates => serde_json::to_value(workflow.list_templates().await?)?,
            WorkflowOperation::TemplateDetails => {
                let input: TemplateInput = parse(name, input)?;
                serde_json::to_value(
                    workflow.template_details(&TemplateId(input.template_id)).await?,
                )?
            }
            WorkflowOperation::CreateNda => {
                let input: CreateInput = parse(name, input)?;
                if input.message.is_some() && !input.send {
                    return Err(anyhow!("invalid input for `{name}`: `message` requires `send`"));
                }
                if input.send {
                    let message = input.message.as_deref().unwrap_or(DEFAULT_SEND_MESSAGE);
                    workflow
                        .create_and_send(&input.request, &SendRequest::with_message(message))
                        .await
                        .to_report()
                } else {
                    workflow.create_nda(&input.request).await.to_report()
                }
            }
            WorkflowOperation::SendDocument => {
                let input: DocumentInput = parse(name, input)?;
                let message = input.message.as_deref().unwrap_or(DEFAULT_SEND_MESSAGE);
                workflow
                    .send_nda(&DocumentId(input.document_id), &SendRequest::with_message(message))
                    .await
                    .to_report()
            }
            WorkflowOperation::DocumentStatus => {
                let input: DocumentInput = parse(name, input)?;
                let document_id = DocumentId(input.document_id);
                if input.details {
                    serde_json::to_value(workflow.document_details(&document_id).await?)?
                } else {
                    serde_json::to_value(workflow.document_status(&document_id).await?)?
                }
            }
            WorkflowOperation::ListDocuments => {
                let input: ListInput = parse(name, input)?;
                let query = DocumentQuery {
                    status: input.status.as_deref().map(DocumentStatus::from),
                    limit: input.limit.unwrap_or(DEFAULT_LIST_LIMIT),
                };
                serde_json::to_value(workflow.list_documents(&query).await)?
            }
            WorkflowOperation::DownloadDocument => {
                let input: DocumentInput = parse(name, input)?;
                serde_json::to_value(
                    workflow
                        .download_document(&DocumentId(input.document_id), input.output.as_deref())
                        .await?,
                )?
            }
            WorkflowOperation::Statistics => serde_json::to_value(workflow.get_statistics().await)?,
            WorkflowOperation::PendingSignatures => {
                serde_json::to_value(workflow.check_pending_signatures().await)?
            }
            WorkflowOperation::DailySummary => {
                serde_json::to_value(workflow.send_daily_summary().await)?
            }
            WorkflowOperation::LogAction => {
                let input: LogInput = parse(name, input)?;
                serde_json::to_value(
                    workflow
                        .log_manual_action(
                            &TrackingAction::from(input.action),
                            &DocumentId(input.document_id),
                            &input.details,
                        )
                        .await,
                )?
            }
            WorkflowOperation::HealthCheck => serde_json::to_value(workflow.health_check().await)?,
        };

        Ok(output)
    }
}

/// Parses repeated `key=value` pairs into additional template fields.
pub fn parse_fields<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<BTreeMap<String, String>> {
    pairs
        .into_iter()
        .map(|pair| {
            let (key, value) =
                pair.split_once('=').ok_or_else(|| anyhow!("expected key=value, got `{pair}`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(anyhow!("empty field name in `{pair}`"));
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_fields;

    #[test]
    fn parse_fields_splits_on_first_equals() {
        let fields = parse_fields(["jurisdiction=Delaware", "term = 2 years", "note=a=b"])
            .expect("valid pairs");
        assert_eq!(fields["jurisdiction"], "Delaware");
        assert_eq!(fields["term"], "2 years");
        assert_eq!(fields["note"], "a=b");
    }

    #[test]
    fn parse_fields_rejects_missing_equals() {
        assert!(parse_fields(["jurisdiction"]).is_err());
        assert!(parse_fields(["=value"]).is_err());
    }
}
