use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use ndaflow_core::config::SheetsConfig;
use ndaflow_core::domain::tracking::TIMESTAMP_FORMAT;
use ndaflow_core::{
    DocumentId, IntegrationError, TrackingAction, TrackingDetails, TrackingRow, TrackingSink,
    TrackingStatistics,
};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::auth::{ServiceAccountAuth, ServiceAccountKey};
use crate::client::{a1_range, SheetsClient};

/// Google returns 400 "Unable to parse range" when the tab does not exist.
const MISSING_SHEET_STATUS: u16 = 400;

#[derive(Debug)]
pub struct SheetsTrackingSink {
    client: Option<SheetsClient>,
    sheet_name: String,
}

impl SheetsTrackingSink {
    /// Never fails. A missing spreadsheet id, an absent or unreadable key
    /// file, or a bad private key all yield a disabled sink.
    pub fn from_config(config: &SheetsConfig) -> Self {
        let (Some(credentials_path), Some(spreadsheet_id)) =
            (config.credentials_path.as_deref(), config.spreadsheet_id.as_deref())
        else {
            info!(
                event_name = "sheets.sink.disabled",
                "Google Sheets credentials or spreadsheet id not configured"
            );
            return Self::disabled(&config.sheet_name);
        };
        if !config.is_configured() {
            return Self::disabled(&config.sheet_name);
        }

        let http = Client::new();
        let auth = ServiceAccountKey::from_file(credentials_path)
            .and_then(|key| ServiceAccountAuth::new(key, http.clone()));

        match auth {
            Ok(auth) => {
                info!(
                    event_name = "sheets.sink.initialized",
                    spreadsheet_id = spreadsheet_id,
                    sheet = %config.sheet_name,
                    "Google Sheets service initialized"
                );
                let client =
                    SheetsClient::new(&config.api_base_url, spreadsheet_id, Arc::new(auth), http);
                Self::with_client(client, &config.sheet_name)
            }
            Err(error) => {
                error!(
                    event_name = "sheets.sink.init_failed",
                    credentials_path = %credentials_path.display(),
                    error = %error,
                    "failed to initialize Google Sheets service"
                );
                Self::disabled(&config.sheet_name)
            }
        }
    }

    pub fn with_client(client: SheetsClient, sheet_name: &str) -> Self {
        Self { client: Some(client), sheet_name: sheet_name.to_string() }
    }

    pub fn disabled(sheet_name: &str) -> Self {
        Self { client: None, sheet_name: sheet_name.to_string() }
    }

    fn client(&self) -> Result<&SheetsClient, IntegrationError> {
        self.client.as_ref().ok_or(IntegrationError::NotConfigured("google sheets"))
    }

    async fn create_log_sheet(
        &self,
        client: &SheetsClient,
        row: Vec<String>,
    ) -> Result<(), IntegrationError> {
        client.add_sheet(&self.sheet_name).await?;
        info!(event_name = "sheets.sheet.created", sheet = %self.sheet_name, "created tracking sheet");
        client.append_rows(&self.sheet_name, &[TrackingRow::header_cells(), row]).await
    }
}

#[async_trait]
impl TrackingSink for SheetsTrackingSink {
    fn is_available(&self) -> bool {
        self.client.is_some()
    }

    async fn log_action(
        &self,
        action: &TrackingAction,
        document_id: &DocumentId,
        details: &TrackingDetails,
    ) -> Result<(), IntegrationError> {
        let client = self.client()?;
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let row = TrackingRow::new(timestamp, action, document_id, details).into_cells();

        let appended = match client.append_rows(&self.sheet_name, &[row.clone()]).await {
            Err(error) if error.status_code() == Some(MISSING_SHEET_STATUS) => {
                warn!(
                    event_name = "sheets.sheet.missing",
                    sheet = %self.sheet_name,
                    "tracking sheet not found; creating it with a header row"
                );
                self.create_log_sheet(client, row).await
            }
            other => other,
        };

        if appended.is_ok() {
            info!(
                event_name = "sheets.action.logged",
                action = action.as_str(),
                document_id = %document_id,
                "NDA action logged"
            );
        }
        appended
    }

    async fn statistics(&self) -> TrackingStatistics {
        let Some(client) = self.client.as_ref() else {
            return TrackingStatistics::default();
        };

        match client.read_range(&a1_range(&self.sheet_name, "A:Z")).await {
            Ok(table) => TrackingStatistics::from_table(&table),
            Err(error) => {
                warn!(
                    event_name = "sheets.statistics.degraded",
                    error = %error,
                    "could not read tracking sheet; reporting empty statistics"
                );
                TrackingStatistics::default()
            }
        }
    }
}
