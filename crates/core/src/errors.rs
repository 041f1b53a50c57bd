use thiserror::Error;

/// Failure at an external-service boundary (document provider, spreadsheet,
/// token endpoint). Every adapter surfaces its failures through this one type
/// so callers only ever deal with a message-bearing value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("request to {service} failed: {message}")]
    Transport { service: &'static str, message: String },
    #[error("{service} returned HTTP {status}: {body}")]
    Status { service: &'static str, status: u16, body: String },
    #[error("could not decode {service} response: {message}")]
    Decode { service: &'static str, message: String },
    #[error("io failure: {0}")]
    Io(String),
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl IntegrationError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short machine-readable class used in CLI payloads and log fields.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "upstream_status",
            Self::Decode { .. } => "decode",
            Self::Io(_) => "io",
            Self::NotConfigured(_) => "not_configured",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<std::io::Error> for IntegrationError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
