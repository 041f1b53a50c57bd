//! Append-only tracking log rows and the aggregate computed from them.
//!
//! The remote table is treated as a write-ahead log of NDA actions: rows are
//! appended, never updated or deleted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::document::DocumentId;

pub const TRACKING_HEADER: [&str; 7] =
    ["Timestamp", "Action", "Document ID", "Template Name", "Recipient", "Status", "Details"];
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

const MIN_BUCKETED_CELLS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TrackingAction {
    Created,
    Sent,
    Signed,
    Other(String),
}

impl TrackingAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Sent => "sent",
            Self::Signed => "signed",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for TrackingAction {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "sent" => Self::Sent,
            "signed" => Self::Signed,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<String> for TrackingAction {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<TrackingAction> for String {
    fn from(value: TrackingAction) -> Self {
        value.as_str().to_string()
    }
}

/// Free-form details attached to a tracking row. The well-known keys are
/// lifted into their own columns; everything is also kept in the JSON blob.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackingDetails {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// One row of the tracking table, in column order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingRow {
    pub timestamp: String,
    pub action: String,
    pub document_id: String,
    pub template_name: String,
    pub recipient: String,
    pub status: String,
    pub details_json: String,
}

impl TrackingRow {
    pub fn new(
        timestamp: impl Into<String>,
        action: &TrackingAction,
        document_id: &DocumentId,
        details: &TrackingDetails,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            action: action.as_str().to_string(),
            document_id: document_id.0.clone(),
            template_name: details.template_name.clone().unwrap_or_default(),
            recipient: details.recipient.clone().unwrap_or_default(),
            status: details.status.clone().unwrap_or_default(),
            details_json: details.to_json(),
        }
    }

    pub fn into_cells(self) -> Vec<String> {
        vec![
            self.timestamp,
            self.action,
            self.document_id,
            self.template_name,
            self.recipient,
            self.status,
            self.details_json,
        ]
    }

    pub fn header_cells() -> Vec<String> {
        TRACKING_HEADER.iter().map(|cell| cell.to_string()).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub action: String,
    pub document_id: String,
    pub template_name: String,
    pub recipient: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatistics {
    pub total_documents: usize,
    pub documents_sent: usize,
    pub documents_signed: usize,
    pub pending_signatures: usize,
    pub recent_activity: Vec<ActivityEntry>,
}

impl TrackingStatistics {
    /// Folds the raw table (header row first) into counts.
    ///
    /// Buckets are first-match-wins: a `sent` action, then a `signed` action
    /// or `completed` status, then a `sent` status counted as pending. Rows
    /// shorter than six cells only contribute to the total.
    pub fn from_table(values: &[Vec<String>]) -> Self {
        let Some((_, rows)) = values.split_first() else {
            return Self::default();
        };

        let mut stats = Self { total_documents: rows.len(), ..Self::default() };

        for row in rows.iter().filter(|row| row.len() >= MIN_BUCKETED_CELLS) {
            let action = row[1].as_str();
            let status = row[5].as_str();

            if action == "sent" {
                stats.documents_sent += 1;
            } else if action == "signed" || status == "completed" {
                stats.documents_signed += 1;
            } else if status == "sent" {
                stats.pending_signatures += 1;
            }
        }

        stats.recent_activity = rows
            .iter()
            .rev()
            .filter(|row| row.len() >= MIN_BUCKETED_CELLS)
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|row| ActivityEntry {
                timestamp: row[0].clone(),
                action: row[1].clone(),
                document_id: row[2].clone(),
                template_name: row[3].clone(),
                recipient: row[4].clone(),
            })
            .collect();

        stats
    }
}
