use serde::{Deserialize, Serialize};

use crate::domain::document::DocumentId;
use crate::domain::tracking::TrackingStatistics;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    DocumentCreated { document_id: DocumentId, template_name: String, recipient: String },
    DocumentSent { document_id: DocumentId, template_name: String, recipient: String },
    DocumentSigned { document_id: DocumentId, template_name: String, recipient: String },
    DocumentError { document_id: DocumentId, error_message: String },
    DailySummary { statistics: TrackingStatistics },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DocumentCreated { .. } => "document_created",
            Self::DocumentSent { .. } => "document_sent",
            Self::DocumentSigned { .. } => "document_signed",
            Self::DocumentError { .. } => "document_error",
            Self::DailySummary { .. } => "daily_summary",
        }
    }

    pub fn is_html(&self) -> bool {
        matches!(self, Self::DailySummary { .. })
    }
}
