use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use ndaflow_core::IntegrationError;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error};

const SERVICE: &str = "google oauth";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const EXPIRY_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> Result<SecretString, IntegrationError>;
}

/// Fixed bearer token, for pre-issued credentials and tests.
pub struct StaticToken(SecretString);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> Result<SecretString, IntegrationError> {
        Ok(self.0.clone())
    }
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a Google service-account key file this crate needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, IntegrationError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, IntegrationError> {
        serde_json::from_str(raw).map_err(|error| IntegrationError::Decode {
            service: "service account key",
            message: error.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

struct CachedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

/// Signs an RS256 assertion with the service-account key and exchanges it
/// for a bearer token, reusing the token until shortly before it expires.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: Client) -> Result<Self, IntegrationError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(
            |error| IntegrationError::Decode {
                service: "service account key",
                message: format!("private_key is not a valid RSA PEM: {error}"),
            },
        )?;

        Ok(Self { key, encoding_key, http, cached: Mutex::new(None) })
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, IntegrationError> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key).map_err(|error| {
            IntegrationError::InvalidRequest(format!("could not sign token assertion: {error}"))
        })
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken, IntegrationError> {
        let assertion = self.signed_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|error| {
                error!(event_name = "sheets.auth.request_failed", error = %error);
                IntegrationError::Transport { service: SERVICE, message: error.to_string() }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Status { service: SERVICE, status: status.as_u16(), body });
        }

        let token: TokenResponse = response.json().await.map_err(|error| {
            IntegrationError::Decode { service: SERVICE, message: error.to_string() }
        })?;
        if token.access_token.is_empty() {
            return Err(IntegrationError::Decode {
                service: SERVICE,
                message: "token endpoint returned an empty access token".to_string(),
            });
        }

        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        debug!(event_name = "sheets.auth.token_issued", expires_in = lifetime);
        Ok(CachedToken {
            token: token.access_token.into(),
            expires_at: now + Duration::seconds(lifetime - EXPIRY_MARGIN_SECS),
        })
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountAuth {
    async fn access_token(&self) -> Result<SecretString, IntegrationError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(current) = cached.as_ref() {
            if current.expires_at > now {
                return Ok(current.token.clone());
            }
        }

        let fresh = self.exchange(now).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}

pub(crate) fn bearer(token: &SecretString) -> String {
    format!("Bearer {}", token.expose_secret())
}

#[cfg(test)]
mod tests {
    use super::{ServiceAccountAuth, ServiceAccountKey};

    #[test]
    fn key_file_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "ndaflow@project.iam.gserviceaccount.com", "private_key": "x"}"#,
        )
        .expect("key should decode");

        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        assert!(!format!("{key:?}").contains("private_key"));
    }

    #[test]
    fn key_without_client_email_is_rejected() {
        let error = ServiceAccountKey::from_json(r#"{"private_key": "x"}"#)
            .expect_err("client_email is required");
        assert_eq!(error.error_class(), "decode");
    }

    #[test]
    fn non_pem_private_key_is_rejected() {
        let key = ServiceAccountKey::from_json(
            r#"{"client_email": "a@b.test", "private_key": "not a pem"}"#,
        )
        .expect("key should decode");

        let result = ServiceAccountAuth::new(key, reqwest::Client::new());
        assert!(result.is_err());
    }
}
