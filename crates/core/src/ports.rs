//! Seams between the orchestrator and the external services it drives.
//!
//! Every call is awaited to completion before the next one starts; none of
//! these traits retry, queue or batch.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::document::{
    CreatedDocument, DocumentCreateRequest, DocumentDetails, DocumentId, DocumentList,
    DocumentQuery, DocumentSummary, DownloadReceipt, SendReceipt, SendRequest,
};
use crate::domain::notification::Notification;
use crate::domain::template::{TemplateDetails, TemplateId, TemplateList};
use crate::domain::tracking::{TrackingAction, TrackingDetails, TrackingStatistics};
use crate::errors::IntegrationError;

#[async_trait]
pub trait DocumentProvider: Send + Sync {
    async fn list_templates(&self) -> Result<TemplateList, IntegrationError>;

    async fn template_details(
        &self,
        template_id: &TemplateId,
    ) -> Result<TemplateDetails, IntegrationError>;

    async fn create_document(
        &self,
        request: &DocumentCreateRequest,
    ) -> Result<CreatedDocument, IntegrationError>;

    async fn send_document(
        &self,
        document_id: &DocumentId,
        request: &SendRequest,
    ) -> Result<SendReceipt, IntegrationError>;

    async fn document_status(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentSummary, IntegrationError>;

    async fn document_details(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentDetails, IntegrationError>;

    /// Never fails: request errors collapse into an empty list so aggregate
    /// reads downstream keep working.
    async fn list_documents(&self, query: &DocumentQuery) -> DocumentList;

    async fn download_document(
        &self,
        document_id: &DocumentId,
        save_path: Option<&Path>,
    ) -> Result<DownloadReceipt, IntegrationError>;
}

#[async_trait]
pub trait TrackingSink: Send + Sync {
    /// Whether the underlying service handle was initialised. Says nothing
    /// about current reachability.
    fn is_available(&self) -> bool;

    async fn log_action(
        &self,
        action: &TrackingAction,
        document_id: &DocumentId,
        details: &TrackingDetails,
    ) -> Result<(), IntegrationError>;

    /// Zeroed statistics when the table is empty or unreadable.
    async fn statistics(&self) -> TrackingStatistics;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn is_enabled(&self) -> bool;

    /// Returns `false` instead of erroring when disabled or when delivery
    /// fails.
    async fn notify(&self, notification: &Notification) -> bool;
}
