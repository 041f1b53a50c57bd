use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::template::TemplateId;

pub const DEFAULT_RECIPIENT_ROLE: &str = "signer";
pub const DEFAULT_LIST_LIMIT: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status as reported by the document provider. Transitions are
/// owned by the provider; this side only observes them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentStatus {
    Draft,
    Uploaded,
    Sent,
    Viewed,
    WaitingApproval,
    Approved,
    Rejected,
    WaitingPay,
    Paid,
    Completed,
    Voided,
    Declined,
    ExternalReview,
    Other(String),
}

impl DocumentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "document.draft",
            Self::Uploaded => "document.uploaded",
            Self::Sent => "document.sent",
            Self::Viewed => "document.viewed",
            Self::WaitingApproval => "document.waiting_approval",
            Self::Approved => "document.approved",
            Self::Rejected => "document.rejected",
            Self::WaitingPay => "document.waiting_pay",
            Self::Paid => "document.paid",
            Self::Completed => "document.completed",
            Self::Voided => "document.voided",
            Self::Declined => "document.declined",
            Self::ExternalReview => "document.external_review",
            Self::Other(raw) => raw,
        }
    }

    /// Short form used in list filters and tracking rows (`sent`, `completed`).
    pub fn short_name(&self) -> &str {
        let full = self.as_str();
        full.strip_prefix("document.").unwrap_or(full)
    }
}

impl From<&str> for DocumentStatus {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        let short = trimmed.strip_prefix("document.").unwrap_or(trimmed);
        match short.to_ascii_lowercase().as_str() {
            "draft" => Self::Draft,
            "uploaded" => Self::Uploaded,
            "sent" => Self::Sent,
            "viewed" => Self::Viewed,
            "waiting_approval" => Self::WaitingApproval,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "waiting_pay" => Self::WaitingPay,
            "paid" => Self::Paid,
            "completed" => Self::Completed,
            "voided" => Self::Voided,
            "declined" => Self::Declined,
            "external_review" => Self::ExternalReview,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for DocumentStatus {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<DocumentStatus> for String {
    fn from(value: DocumentStatus) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: String,
}

impl Recipient {
    /// First whitespace-separated word becomes the first name, the remainder
    /// the last name.
    pub fn from_full_name(email: impl Into<String>, full_name: &str, role: Option<&str>) -> Self {
        let mut words = full_name.split_whitespace();
        let first_name = words.next().unwrap_or_default().to_string();
        let last_name = words.collect::<Vec<_>>().join(" ");

        Self {
            email: email.into(),
            first_name,
            last_name,
            role: role.unwrap_or(DEFAULT_RECIPIENT_ROLE).to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

/// Named substitution value merged into a document at creation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCreateRequest {
    pub name: String,
    #[serde(rename = "template_uuid")]
    pub template_id: TemplateId,
    pub recipients: Vec<Recipient>,
    pub tokens: Vec<Token>,
}

impl DocumentCreateRequest {
    pub fn new(
        name: impl Into<String>,
        template_id: TemplateId,
        recipients: Vec<Recipient>,
        tokens: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            template_id,
            recipients,
            tokens: tokens
                .iter()
                .map(|(name, value)| Token { name: name.clone(), value: value.clone() })
                .collect(),
        }
    }
}

/// Provider response to a create call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub id: DocumentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub date_created: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub message: String,
    pub silent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl SendRequest {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self { message: message.into(), silent: false, subject: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendReceipt {
    pub document_id: DocumentId,
    pub status: DocumentStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_modified: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub recipients: Vec<DocumentRecipient>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecipient {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub has_completed: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDetails {
    pub id: DocumentId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<DocumentStatus>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_modified: Option<String>,
    #[serde(default)]
    pub recipients: Vec<DocumentRecipient>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentQuery {
    pub status: Option<DocumentStatus>,
    pub limit: u32,
}

impl Default for DocumentQuery {
    fn default() -> Self {
        Self { status: None, limit: DEFAULT_LIST_LIMIT }
    }
}

impl DocumentQuery {
    pub fn with_status(status: DocumentStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    pub fn with_limit(limit: u32) -> Self {
        Self { limit, ..Self::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub results: Vec<DocumentSummary>,
    #[serde(default)]
    pub count: usize,
}

impl DocumentList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_results(results: Vec<DocumentSummary>) -> Self {
        let count = results.len();
        Self { results, count }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadReceipt {
    pub document_id: DocumentId,
    pub file_path: PathBuf,
    pub file_size: u64,
}
