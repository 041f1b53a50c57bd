use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::document::{DocumentId, DocumentStatus};
use crate::domain::template::TemplateId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdaRequest {
    pub template_id: TemplateId,
    pub recipient_email: String,
    pub recipient_name: String,
    pub company_name: String,
    #[serde(default)]
    pub additional_fields: BTreeMap<String, String>,
}

impl NdaRequest {
    pub fn document_name(&self) -> String {
        format!("NDA - {} - {}", self.company_name, self.recipient_name)
    }

    /// Default tokens merged with caller-supplied fields; caller values win.
    pub fn tokens(&self, date: &str) -> BTreeMap<String, String> {
        let mut tokens = BTreeMap::from([
            ("recipient_name".to_string(), self.recipient_name.clone()),
            ("company_name".to_string(), self.company_name.clone()),
            ("date".to_string(), date.to_string()),
        ]);
        tokens.extend(self.additional_fields.clone());
        tokens
    }
}

/// Result of one best-effort side effect. Never promoted into a workflow
/// failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum SideEffect {
    Skipped,
    Succeeded,
    Failed(String),
}

impl SideEffect {
    pub fn from_bool(delivered: bool, failure: &str) -> Self {
        if delivered {
            Self::Succeeded
        } else {
            Self::Failed(failure.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryOutcome {
    pub logged: SideEffect,
    pub notified: SideEffect,
}

impl AuxiliaryOutcome {
    pub fn skipped() -> Self {
        Self { logged: SideEffect::Skipped, notified: SideEffect::Skipped }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub document_id: DocumentId,
    pub document_name: Option<String>,
    /// Workflow step that completed, `created` or `sent`. Matches the
    /// tracking row for the same step.
    pub status: String,
    pub provider_status: DocumentStatus,
    pub next_steps: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PrimaryOutcome {
    Completed(DocumentOutcome),
    Failed { error: String },
}

/// Outcome of a create or send workflow: the primary provider call decides
/// success; logging and notification are reported alongside but separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub primary: PrimaryOutcome,
    pub auxiliary: AuxiliaryOutcome,
}

impl WorkflowResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            primary: PrimaryOutcome::Failed { error: error.into() },
            auxiliary: AuxiliaryOutcome::skipped(),
        }
    }

    pub fn success(&self) -> bool {
        matches!(self.primary, PrimaryOutcome::Completed(_))
    }

    pub fn document(&self) -> Option<&DocumentOutcome> {
        match &self.primary {
            PrimaryOutcome::Completed(document) => Some(document),
            PrimaryOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.primary {
            PrimaryOutcome::Completed(_) => None,
            PrimaryOutcome::Failed { error } => Some(error),
        }
    }

    /// Flat report shape used by the CLI and the conversational tools.
    pub fn to_report(&self) -> Value {
        match &self.primary {
            PrimaryOutcome::Completed(document) => json!({
                "success": true,
                "document_id": document.document_id,
                "document_name": document.document_name,
                "status": document.status,
                "provider_status": document.provider_status.short_name(),
                "next_steps": document.next_steps,
                "logged": self.auxiliary.logged,
                "notified": self.auxiliary.notified,
            }),
            PrimaryOutcome::Failed { error } => json!({
                "success": false,
                "error": error,
            }),
        }
    }
}
