use std::sync::Arc;

use ndaflow_core::IntegrationError;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::auth::{bearer, AccessTokenSource};

const SERVICE: &str = "google sheets";

/// Thin wrapper over the three Sheets v4 calls the tracking sink needs.
#[derive(Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    auth: Arc<dyn AccessTokenSource>,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base_url", &self.base_url)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

impl SheetsClient {
    pub fn new(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        auth: Arc<dyn AccessTokenSource>,
        http: Client,
    ) -> Self {
        Self { http, base_url: base_url.into(), spreadsheet_id: spreadsheet_id.into(), auth }
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// `GET /v4/spreadsheets/{id}/values/{range}`. A range with no data
    /// decodes to an empty table.
    pub async fn read_range(&self, range: &str) -> Result<Vec<Vec<String>>, IntegrationError> {
        let url = self.url(&["values", range], None)?;
        let response = self.authorized(self.http.get(url)).await?.send().await;
        let range_values: ValueRange = decode_json(ensure_success("values.get", response).await?).await?;

        debug!(
            event_name = "sheets.values.read",
            range = range,
            rows = range_values.values.len()
        );
        Ok(range_values.values.into_iter().map(|row| row.into_iter().map(cell_text).collect()).collect())
    }

    /// Appends rows after the last non-empty row of `sheet_name`, storing the
    /// cells verbatim.
    pub async fn append_rows(
        &self,
        sheet_name: &str,
        rows: &[Vec<String>],
    ) -> Result<(), IntegrationError> {
        let range = format!("{}:append", a1_range(sheet_name, "A:Z"));
        let url = self.url(&["values", &range], None)?;
        let response = self
            .authorized(self.http.post(url))
            .await?
            .query(&[("valueInputOption", "RAW")])
            .json(&json!({ "values": rows }))
            .send()
            .await;
        ensure_success("values.append", response).await?;

        debug!(event_name = "sheets.values.appended", sheet = sheet_name, rows = rows.len());
        Ok(())
    }

    pub async fn add_sheet(&self, title: &str) -> Result<(), IntegrationError> {
        let url = self.url(&[], Some(":batchUpdate"))?;
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self.authorized(self.http.post(url)).await?.json(&body).send().await;
        ensure_success("batchUpdate", response).await?;
        Ok(())
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, IntegrationError> {
        let token = self.auth.access_token().await?;
        Ok(builder.header("Authorization", bearer(&token)))
    }

    fn url(&self, segments: &[&str], id_suffix: Option<&str>) -> Result<Url, IntegrationError> {
        let mut url = Url::parse(&self.base_url).map_err(|error| {
            IntegrationError::InvalidRequest(format!("invalid sheets base url: {error}"))
        })?;
        let spreadsheet = format!("{}{}", self.spreadsheet_id, id_suffix.unwrap_or_default());

        url.path_segments_mut()
            .map_err(|_| {
                IntegrationError::InvalidRequest("sheets base url cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet.as_str()])
            .extend(segments);
        Ok(url)
    }
}

/// `Sheet!A:Z`, quoting the sheet title when it holds anything beyond
/// letters, digits and underscores.
pub fn a1_range(sheet_name: &str, cells: &str) -> String {
    let plain = !sheet_name.is_empty()
        && sheet_name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if plain {
        format!("{sheet_name}!{cells}")
    } else {
        format!("'{}'!{cells}", sheet_name.replace('\'', "''"))
    }
}

fn cell_text(cell: Value) -> String {
    match cell {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

async fn ensure_success(
    operation: &'static str,
    response: Result<Response, reqwest::Error>,
) -> Result<Response, IntegrationError> {
    let response = response.map_err(|error| {
        error!(
            event_name = "sheets.request.failed",
            operation = operation,
            error = %error,
            "Google Sheets request failed"
        );
        IntegrationError::Transport { service: SERVICE, message: error.to_string() }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(
        event_name = "sheets.request.rejected",
        operation = operation,
        status = status.as_u16(),
        "Google Sheets returned a non-success status"
    );
    Err(IntegrationError::Status { service: SERVICE, status: status.as_u16(), body })
}

async fn decode_json<T>(response: Response) -> Result<T, IntegrationError>
where
    T: serde::de::DeserializeOwned,
{
    response
        .json::<T>()
        .await
        .map_err(|error| IntegrationError::Decode { service: SERVICE, message: error.to_string() })
}
