use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PANDADOC_BASE_URL: &str = "https://api.pandadoc.com/public/v1";
pub const DEFAULT_SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_TRACKING_SHEET: &str = "NDA_Log";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub pandadoc: PandaDocConfig,
    pub sheets: SheetsConfig,
    pub notification: NotificationConfig,
    pub agent: AgentConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct PandaDocConfig {
    pub api_key: SecretString,
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct SheetsConfig {
    pub credentials_path: Option<PathBuf>,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub email: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub debug_mode: bool,
    pub verbose_logging: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub pandadoc_api_key: Option<String>,
    pub pandadoc_base_url: Option<String>,
    pub sheets_credentials_path: Option<PathBuf>,
    pub sheets_spreadsheet_id: Option<String>,
    pub sheets_api_base_url: Option<String>,
    pub notification_email: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pandadoc: PandaDocConfig {
                api_key: String::new().into(),
                base_url: DEFAULT_PANDADOC_BASE_URL.to_string(),
            },
            sheets: SheetsConfig {
                credentials_path: None,
                spreadsheet_id: None,
                sheet_name: DEFAULT_TRACKING_SHEET.to_string(),
                api_base_url: DEFAULT_SHEETS_API_BASE_URL.to_string(),
            },
            notification: NotificationConfig {
                email: None,
                smtp_host: "smtp.gmail.com".to_string(),
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
            },
            agent: AgentConfig {
                name: "NDA Agent".to_string(),
                description: "AI agent for NDA document management".to_string(),
                debug_mode: false,
                verbose_logging: false,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl SheetsConfig {
    /// Both the credentials file and the spreadsheet id are needed before the
    /// tracking sink can open a service handle.
    pub fn is_configured(&self) -> bool {
        self.credentials_path.is_some()
            && self.spreadsheet_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

impl NotificationConfig {
    pub fn is_configured(&self) -> bool {
        let present = |value: Option<&str>| value.is_some_and(|value| !value.trim().is_empty());
        present(self.email.as_deref())
            && present(self.smtp_username.as_deref())
            && present(self.smtp_password.as_ref().map(|secret| secret.expose_secret()))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("ndaflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Log level after the agent debug/verbose toggles are taken into account.
    pub fn effective_log_level(&self) -> &str {
        if self.agent.debug_mode || self.agent.verbose_logging {
            "debug"
        } else {
            &self.logging.level
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(pandadoc) = patch.pandadoc {
            if let Some(api_key_value) = pandadoc.api_key {
                self.pandadoc.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = pandadoc.base_url {
                self.pandadoc.base_url = base_url;
            }
        }

        if let Some(sheets) = patch.sheets {
            if let Some(credentials_path) = sheets.credentials_path {
                self.sheets.credentials_path = Some(credentials_path);
            }
            if let Some(spreadsheet_id) = sheets.spreadsheet_id {
                self.sheets.spreadsheet_id = Some(spreadsheet_id);
            }
            if let Some(sheet_name) = sheets.sheet_name {
                self.sheets.sheet_name = sheet_name;
            }
            if let Some(api_base_url) = sheets.api_base_url {
                self.sheets.api_base_url = api_base_url;
            }
        }

        if let Some(notification) = patch.notification {
            if let Some(email) = notification.email {
                self.notification.email = Some(email);
            }
            if let Some(smtp_host) = notification.smtp_host {
                self.notification.smtp_host = smtp_host;
            }
            if let Some(smtp_port) = notification.smtp_port {
                self.notification.smtp_port = smtp_port;
            }
            if let Some(smtp_username) = notification.smtp_username {
                self.notification.smtp_username = Some(smtp_username);
            }
            if let Some(smtp_password_value) = notification.smtp_password {
                self.notification.smtp_password = Some(secret_value(smtp_password_value));
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(name) = agent.name {
                self.agent.name = name;
            }
            if let Some(description) = agent.description {
                self.agent.description = description;
            }
            if let Some(debug_mode) = agent.debug_mode {
                self.agent.debug_mode = debug_mode;
            }
            if let Some(verbose_logging) = agent.verbose_logging {
                self.agent.verbose_logging = verbose_logging;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_alias("NDAFLOW_PANDADOC_API_KEY", "PANDADOC_API_KEY") {
            self.pandadoc.api_key = secret_value(value);
        }
        if let Some(value) = read_env("NDAFLOW_PANDADOC_BASE_URL") {
            self.pandadoc.base_url = value;
        }

        if let Some(value) =
            read_env_alias("NDAFLOW_SHEETS_CREDENTIALS_PATH", "GOOGLE_SHEETS_CREDENTIALS_PATH")
        {
            self.sheets.credentials_path = Some(PathBuf::from(value));
        }
        if let Some(value) =
            read_env_alias("NDAFLOW_SHEETS_SPREADSHEET_ID", "GOOGLE_SHEETS_SPREADSHEET_ID")
        {
            self.sheets.spreadsheet_id = Some(value);
        }
        if let Some(value) = read_env("NDAFLOW_SHEETS_SHEET_NAME") {
            self.sheets.sheet_name = value;
        }
        if let Some(value) = read_env("NDAFLOW_SHEETS_API_BASE_URL") {
            self.sheets.api_base_url = value;
        }

        if let Some(value) = read_env_alias("NDAFLOW_NOTIFICATION_EMAIL", "NOTIFICATION_EMAIL") {
            self.notification.email = Some(value);
        }
        if let Some(value) = read_env_alias("NDAFLOW_SMTP_HOST", "SMTP_SERVER") {
            self.notification.smtp_host = value;
        }
        if let Some((key, value)) = read_env_alias_keyed("NDAFLOW_SMTP_PORT", "SMTP_PORT") {
            self.notification.smtp_port = parse_u16(key, &value)?;
        }
        if let Some(value) = read_env_alias("NDAFLOW_SMTP_USERNAME", "SMTP_USERNAME") {
            self.notification.smtp_username = Some(value);
        }
        if let Some(value) = read_env_alias("NDAFLOW_SMTP_PASSWORD", "SMTP_PASSWORD") {
            self.notification.smtp_password = Some(secret_value(value));
        }

        if let Some(value) = read_env_alias("NDAFLOW_AGENT_NAME", "AGENT_NAME") {
            self.agent.name = value;
        }
        if let Some(value) = read_env_alias("NDAFLOW_AGENT_DESCRIPTION", "AGENT_DESCRIPTION") {
            self.agent.description = value;
        }
        if let Some((key, value)) = read_env_alias_keyed("NDAFLOW_DEBUG_MODE", "DEBUG_MODE") {
            self.agent.debug_mode = parse_bool(key, &value)?;
        }
        if let Some((key, value)) =
            read_env_alias_keyed("NDAFLOW_VERBOSE_LOGGING", "VERBOSE_LOGGING")
        {
            self.agent.verbose_logging = parse_bool(key, &value)?;
        }

        let log_level = read_env("NDAFLOW_LOGGING_LEVEL").or_else(|| read_env("NDAFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("NDAFLOW_LOGGING_FORMAT").or_else(|| read_env("NDAFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_key) = overrides.pandadoc_api_key {
            self.pandadoc.api_key = secret_value(api_key);
        }
        if let Some(base_url) = overrides.pandadoc_base_url {
            self.pandadoc.base_url = base_url;
        }
        if let Some(credentials_path) = overrides.sheets_credentials_path {
            self.sheets.credentials_path = Some(credentials_path);
        }
        if let Some(spreadsheet_id) = overrides.sheets_spreadsheet_id {
            self.sheets.spreadsheet_id = Some(spreadsheet_id);
        }
        if let Some(api_base_url) = overrides.sheets_api_base_url {
            self.sheets.api_base_url = api_base_url;
        }
        if let Some(email) = overrides.notification_email {
            self.notification.email = Some(email);
        }
        if let Some(smtp_host) = overrides.smtp_host {
            self.notification.smtp_host = smtp_host;
        }
        if let Some(smtp_port) = overrides.smtp_port {
            self.notification.smtp_port = smtp_port;
        }
        if let Some(smtp_username) = overrides.smtp_username {
            self.notification.smtp_username = Some(smtp_username);
        }
        if let Some(smtp_password) = overrides.smtp_password {
            self.notification.smtp_password = Some(secret_value(smtp_password));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pandadoc(&self.pandadoc)?;
        validate_sheets(&self.sheets)?;
        validate_notification(&self.notification)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("ndaflow.toml"), PathBuf::from("config/ndaflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_pandadoc(pandadoc: &PandaDocConfig) -> Result<(), ConfigError> {
    if pandadoc.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "pandadoc.api_key is required. Set PANDADOC_API_KEY (or NDAFLOW_PANDADOC_API_KEY) from PandaDoc > Settings > Integrations > API".to_string(),
        ));
    }

    validate_http_url("pandadoc.base_url", &pandadoc.base_url)
}

fn validate_sheets(sheets: &SheetsConfig) -> Result<(), ConfigError> {
    if sheets.sheet_name.trim().is_empty() {
        return Err(ConfigError::Validation("sheets.sheet_name must not be empty".to_string()));
    }

    validate_http_url("sheets.api_base_url", &sheets.api_base_url)
}

fn validate_notification(notification: &NotificationConfig) -> Result<(), ConfigError> {
    if notification.smtp_port == 0 {
        return Err(ConfigError::Validation(
            "notification.smtp_port must be greater than zero".to_string(),
        ));
    }

    if notification.smtp_host.trim().is_empty() {
        return Err(ConfigError::Validation(
            "notification.smtp_host must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_alias(primary: &str, legacy: &str) -> Option<String> {
    read_env(primary).or_else(|| read_env(legacy))
}

fn read_env_alias_keyed<'a>(primary: &'a str, legacy: &'a str) -> Option<(&'a str, String)> {
    read_env(primary)
        .map(|value| (primary, value))
        .or_else(|| read_env(legacy).map(|value| (legacy, value)))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// `true/false`, `1/0`, `yes/no` and `on/off` in any case. Legacy unprefixed
/// names treat any other value as false; `NDAFLOW_*` names reject it.
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ if !key.starts_with("NDAFLOW_") => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    pandadoc: Option<PandaDocPatch>,
    sheets: Option<SheetsPatch>,
    notification: Option<NotificationPatch>,
    agent: Option<AgentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct PandaDocPatch {
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SheetsPatch {
    credentials_path: Option<PathBuf>,
    spreadsheet_id: Option<String>,
    sheet_name: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    email: Option<String>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    smtp_username: Option<String>,
    smtp_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    name: Option<String>,
    description: Option<String>,
    debug_mode: Option<bool>,
    verbose_logging: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_KEYS: &[&str] = &[
        "NDAFLOW_PANDADOC_API_KEY",
        "PANDADOC_API_KEY",
        "NDAFLOW_SMTP_PORT",
        "SMTP_PORT",
        "SMTP_USERNAME",
        "SMTP_PASSWORD",
        "NOTIFICATION_EMAIL",
        "DEBUG_MODE",
        "NDAFLOW_DEBUG_MODE",
        "VERBOSE_LOGGING",
        "NDAFLOW_LOG_LEVEL",
        "NDAFLOW_LOG_FORMAT",
        "TEST_PANDADOC_KEY",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn missing_api_key_fails_fast() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        let error = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => return Err("expected validation failure but config load succeeded".into()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("pandadoc.api_key")),
            "validation failure should mention pandadoc.api_key",
        )
    }

    #[test]
    fn legacy_env_names_are_accepted() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("PANDADOC_API_KEY", "legacy-key");
        env::set_var("SMTP_PORT", "2525");
        env::set_var("DEBUG_MODE", "True");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.pandadoc.api_key.expose_secret() == "legacy-key",
                "legacy api key variable should be honoured",
            )?;
            ensure(config.notification.smtp_port == 2525, "legacy smtp port should be parsed")?;
            ensure(config.agent.debug_mode, "debug flag should parse case-insensitively")?;
            ensure(config.effective_log_level() == "debug", "debug mode should raise log level")
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn legacy_debug_flags_never_block_startup() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("PANDADOC_API_KEY", "key");
        env::set_var("DEBUG_MODE", "1");
        env::set_var("VERBOSE_LOGGING", "enabled");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(config.agent.debug_mode, "DEBUG_MODE=1 should enable debug mode")?;
            ensure(!config.agent.verbose_logging, "unrecognised legacy value reads as false")
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn prefixed_debug_flag_rejects_unknown_values() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("PANDADOC_API_KEY", "key");
        env::set_var("NDAFLOW_DEBUG_MODE", "sometimes");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid flag to be rejected".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "NDAFLOW_DEBUG_MODE", "error should name the prefixed variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn prefixed_env_wins_over_legacy_name() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("PANDADOC_API_KEY", "legacy-key");
        env::set_var("NDAFLOW_PANDADOC_API_KEY", "prefixed-key");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            ensure(
                config.pandadoc.api_key.expose_secret() == "prefixed-key",
                "prefixed variable should win",
            )
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn file_load_supports_env_interpolation_and_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("TEST_PANDADOC_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("ndaflow.toml");
            fs::write(
                &path,
                r#"
[pandadoc]
api_key = "${TEST_PANDADOC_KEY}"

[sheets]
spreadsheet_id = "sheet-from-file"
sheet_name = "Audit"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.pandadoc.api_key.expose_secret() == "key-from-env",
                "api key should be interpolated from environment",
            )?;
            ensure(
                config.sheets.spreadsheet_id.as_deref() == Some("sheet-from-file"),
                "spreadsheet id should come from file",
            )?;
            ensure(config.sheets.sheet_name == "Audit", "sheet name should come from file")?;
            ensure(!config.sheets.is_configured(), "sheets need a credentials path too")?;
            ensure(config.logging.level == "debug", "override should win over file")
        })();

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn notification_requires_email_username_and_password() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        let partial = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                pandadoc_api_key: Some("key".to_string()),
                notification_email: Some("ops@acme.test".to_string()),
                smtp_username: Some("mailer".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;
        ensure(!partial.notification.is_configured(), "password is still missing")?;

        let complete = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                pandadoc_api_key: Some("key".to_string()),
                notification_email: Some("ops@acme.test".to_string()),
                smtp_username: Some("mailer".to_string()),
                smtp_password: Some("hunter2".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;
        ensure(complete.notification.is_configured(), "all three values are present")
    }

    #[test]
    fn invalid_port_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("PANDADOC_API_KEY", "key");
        env::set_var("SMTP_PORT", "not-a-port");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid port to be rejected".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "SMTP_PORT", "error should name the legacy variable")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(ENV_KEYS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_KEYS);

        env::set_var("PANDADOC_API_KEY", "pd-secret-value");
        env::set_var("SMTP_PASSWORD", "smtp-secret-value");
        env::set_var("NDAFLOW_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("pd-secret-value"), "debug output should not contain api key")?;
            ensure(
                !debug.contains("smtp-secret-value"),
                "debug output should not contain smtp password",
            )?;
            ensure(matches!(config.logging.format, LogFormat::Json), "json format from env")
        })();

        clear_vars(ENV_KEYS);
        result
    }
}
