pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;

pub use domain::document::{
    CreatedDocument, DocumentCreateRequest, DocumentDetails, DocumentId, DocumentList,
    DocumentQuery, DocumentStatus, DocumentSummary, DownloadReceipt, Recipient, SendReceipt,
    SendRequest, Token,
};
pub use domain::health::{ComponentHealth, ComponentStatus, HealthReport, OverallStatus};
pub use domain::notification::Notification;
pub use domain::template::{TemplateDetails, TemplateId, TemplateList, TemplateSummary};
pub use domain::tracking::{
    ActivityEntry, TrackingAction, TrackingDetails, TrackingRow, TrackingStatistics,
};
pub use domain::workflow::{
    AuxiliaryOutcome, DocumentOutcome, NdaRequest, PrimaryOutcome, SideEffect, WorkflowResult,
};
pub use errors::IntegrationError;
pub use ports::{DocumentProvider, Notifier, TrackingSink};
