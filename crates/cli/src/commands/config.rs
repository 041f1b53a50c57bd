use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ndaflow_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

struct Field<'a> {
    key: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        Field {
            key: "pandadoc.api_key",
            value: redact_secret(config.pandadoc.api_key.expose_secret()),
            env_keys: &["NDAFLOW_PANDADOC_API_KEY", "PANDADOC_API_KEY"],
        },
        Field {
            key: "pandadoc.base_url",
            value: config.pandadoc.base_url.clone(),
            env_keys: &["NDAFLOW_PANDADOC_BASE_URL"],
        },
        Field {
            key: "sheets.credentials_path",
            value: optional(config.sheets.credentials_path.as_ref().map(|p| p.display().to_string())),
            env_keys: &["NDAFLOW_SHEETS_CREDENTIALS_PATH", "GOOGLE_SHEETS_CREDENTIALS_PATH"],
        },
        Field {
            key: "sheets.spreadsheet_id",
            value: optional(config.sheets.spreadsheet_id.clone()),
            env_keys: &["NDAFLOW_SHEETS_SPREADSHEET_ID", "GOOGLE_SHEETS_SPREADSHEET_ID"],
        },
        Field {
            key: "sheets.sheet_name",
            value: config.sheets.sheet_name.clone(),
            env_keys: &["NDAFLOW_SHEETS_SHEET_NAME"],
        },
        Field {
            key: "sheets.api_base_url",
            value: config.sheets.api_base_url.clone(),
            env_keys: &["NDAFLOW_SHEETS_API_BASE_URL"],
        },
        Field {
            key: "notification.email",
            value: optional(config.notification.email.clone()),
            env_keys: &["NDAFLOW_NOTIFICATION_EMAIL", "NOTIFICATION_EMAIL"],
        },
        Field {
            key: "notification.smtp_host",
            value: config.notification.smtp_host.clone(),
            env_keys: &["NDAFLOW_SMTP_HOST", "SMTP_SERVER"],
        },
        Field {
            key: "notification.smtp_port",
            value: config.notification.smtp_port.to_string(),
            env_keys: &["NDAFLOW_SMTP_PORT", "SMTP_PORT"],
        },
        Field {
            key: "notification.smtp_username",
            value: optional(config.notification.smtp_username.clone()),
            env_keys: &["NDAFLOW_SMTP_USERNAME", "SMTP_USERNAME"],
        },
        Field {
            key: "notification.smtp_password",
            value: match &config.notification.smtp_password {
                Some(secret) => redact_secret(secret.expose_secret()),
                None => "<unset>".to_string(),
            },
            env_keys: &["NDAFLOW_SMTP_PASSWORD", "SMTP_PASSWORD"],
        },
        Field {
            key: "agent.name",
            value: config.agent.name.clone(),
            env_keys: &["NDAFLOW_AGENT_NAME", "AGENT_NAME"],
        },
        Field {
            key: "agent.debug_mode",
            value: config.agent.debug_mode.to_string(),
            env_keys: &["NDAFLOW_DEBUG_MODE", "DEBUG_MODE"],
        },
        Field {
            key: "agent.verbose_logging",
            value: config.agent.verbose_logging.to_string(),
            env_keys: &["NDAFLOW_VERBOSE_LOGGING", "VERBOSE_LOGGING"],
        },
        Field {
            key: "logging.level",
            value: config.effective_log_level().to_string(),
            env_keys: &["NDAFLOW_LOGGING_LEVEL", "NDAFLOW_LOG_LEVEL"],
        },
        Field {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["NDAFLOW_LOGGING_FORMAT", "NDAFLOW_LOG_FORMAT"],
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        format!("- {} = {} (source: {source})", field.key, field.value)
    }));
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("ndaflow.toml"), PathBuf::from("config/ndaflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn optional(value: Option<String>) -> String {
    value.unwrap_or_else(|| "<unset>".to_string())
}

/// Keeps the last four characters of long secrets so operators can tell
/// keys apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
