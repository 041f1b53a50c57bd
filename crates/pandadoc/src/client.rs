use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use ndaflow_core::config::PandaDocConfig;
use ndaflow_core::{
    CreatedDocument, DocumentCreateRequest, DocumentDetails, DocumentId, DocumentList,
    DocumentProvider, DocumentQuery, DocumentStatus, DocumentSummary, DownloadReceipt,
    IntegrationError, SendReceipt, SendRequest, TemplateDetails, TemplateId, TemplateList,
};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

const SERVICE: &str = "pandadoc";

#[derive(Clone)]
pub struct PandaDocClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for PandaDocClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PandaDocClient").field("base_url", &self.base_url).finish_non_exhaustive()
    }
}

impl PandaDocClient {
    pub fn new(config: &PandaDocConfig) -> Result<Self, IntegrationError> {
        Self::with_http_client(config, Client::new())
    }

    /// Rejects a blank API key up front so no request is ever issued without
    /// credentials.
    pub fn with_http_client(
        config: &PandaDocConfig,
        http: Client,
    ) -> Result<Self, IntegrationError> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(IntegrationError::NotConfigured("pandadoc api key"));
        }

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("API-Key {}", self.api_key.expose_secret()))
    }

    async fn get_json<T>(&self, endpoint: &str) -> Result<T, IntegrationError>
    where
        T: DeserializeOwned,
    {
        let response = self.authorized(self.http.get(self.url(endpoint))).send().await;
        decode_json(ensure_success(endpoint, response).await?).await
    }

    async fn post_json<B, T>(&self, endpoint: &str, body: &B) -> Result<T, IntegrationError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self.authorized(self.http.post(self.url(endpoint))).json(body).send().await;
        decode_json(ensure_success(endpoint, response).await?).await
    }

    async fn fetch_documents(&self, query: &DocumentQuery) -> Result<DocumentList, IntegrationError> {
        let mut params = vec![("count", query.limit.to_string())];
        if let Some(status) = &query.status {
            params.push(("status", status.short_name().to_string()));
        }

        let response = self
            .authorized(self.http.get(self.url("/documents")))
            .query(&params)
            .send()
            .await;
        let list: DocumentList = decode_json(ensure_success("/documents", response).await?).await?;
        Ok(DocumentList::from_results(list.results))
    }
}

#[async_trait]
impl DocumentProvider for PandaDocClient {
    async fn list_templates(&self) -> Result<TemplateList, IntegrationError> {
        info!(event_name = "provider.templates.list", "fetching templates from PandaDoc");
        self.get_json("/templates").await
    }

    async fn template_details(
        &self,
        template_id: &TemplateId,
    ) -> Result<TemplateDetails, IntegrationError> {
        info!(
            event_name = "provider.templates.details",
            template_id = %template_id,
            "fetching template details"
        );
        self.get_json(&format!("/templates/{template_id}/details")).await
    }

    async fn create_document(
        &self,
        request: &DocumentCreateRequest,
    ) -> Result<CreatedDocument, IntegrationError> {
        info!(
            event_name = "provider.documents.create",
            template_id = %request.template_id,
            document_name = %request.name,
            "creating document from template"
        );
        let created: CreatedDocument = self.post_json("/documents", request).await?;
        info!(
            event_name = "provider.documents.created",
            document_id = %created.id,
            "document created"
        );
        Ok(created)
    }

    async fn send_document(
        &self,
        document_id: &DocumentId,
        request: &SendRequest,
    ) -> Result<SendReceipt, IntegrationError> {
        info!(
            event_name = "provider.documents.send",
            document_id = %document_id,
            silent = request.silent,
            "sending document for signature"
        );
        let payload: Value = self.post_json(&format!("/documents/{document_id}/send"), request).await?;
        let status = payload
            .get("status")
            .and_then(Value::as_str)
            .map(DocumentStatus::from)
            .unwrap_or(DocumentStatus::Sent);

        Ok(SendReceipt { document_id: document_id.clone(), status })
    }

    async fn document_status(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentSummary, IntegrationError> {
        debug!(event_name = "provider.documents.status", document_id = %document_id);
        self.get_json(&format!("/documents/{document_id}")).await
    }

    async fn document_details(
        &self,
        document_id: &DocumentId,
    ) -> Result<DocumentDetails, IntegrationError> {
        debug!(event_name = "provider.documents.details", document_id = %document_id);
        self.get_json(&format!("/documents/{document_id}/details")).await
    }

    async fn list_documents(&self, query: &DocumentQuery) -> DocumentList {
        match self.fetch_documents(query).await {
            Ok(list) => list,
            Err(error) => {
                warn!(
                    event_name = "provider.documents.list_degraded",
                    error = %error,
                    "document listing failed; returning an empty result set"
                );
                DocumentList::empty()
            }
        }
    }

    async fn download_document(
        &self,
        document_id: &DocumentId,
        save_path: Option<&Path>,
    ) -> Result<DownloadReceipt, IntegrationError> {
        let endpoint = format!("/documents/{document_id}/download");
        let response = self.authorized(self.http.get(self.url(&endpoint))).send().await;
        let response = ensure_success(&endpoint, response).await?;
        let content = response.bytes().await.map_err(|error| IntegrationError::Transport {
            service: SERVICE,
            message: error.to_string(),
        })?;

        let file_path =
            save_path.map(Path::to_path_buf).unwrap_or_else(|| default_download_path(document_id));
        tokio::fs::write(&file_path, &content).await?;

        info!(
            event_name = "provider.documents.downloaded",
            document_id = %document_id,
            file_path = %file_path.display(),
            file_size = content.len(),
            "document downloaded"
        );

        Ok(DownloadReceipt {
            document_id: document_id.clone(),
            file_path,
            file_size: content.len() as u64,
        })
    }
}

/// `document_<id>_<YYYYmmdd_HHMMSS>.pdf` in the working directory.
pub fn default_download_path(document_id: &DocumentId) -> PathBuf {
    PathBuf::from(format!(
        "document_{}_{}.pdf",
        document_id,
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

async fn ensure_success(
    endpoint: &str,
    response: Result<Response, reqwest::Error>,
) -> Result<Response, IntegrationError> {
    let response = response.map_err(|error| {
        error!(
            event_name = "provider.request.failed",
            endpoint = endpoint,
            error = %error,
            "PandaDoc API request failed"
        );
        IntegrationError::Transport { service: SERVICE, message: error.to_string() }
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!(
        event_name = "provider.request.rejected",
        endpoint = endpoint,
        status = status.as_u16(),
        "PandaDoc API returned a non-success status"
    );
    Err(IntegrationError::Status { service: SERVICE, status: status.as_u16(), body })
}

async fn decode_json<T>(response: Response) -> Result<T, IntegrationError>
where
    T: DeserializeOwned,
{
    response
        .json::<T>()
        .await
        .map_err(|error| IntegrationError::Decode { service: SERVICE, message: error.to_string() })
}
