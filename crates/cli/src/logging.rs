use ndaflow_core::config::{AppConfig, LogFormat};
use tracing::Level;

/// Installs the global subscriber. A second call is a no-op so commands can
/// run more than once in one process.
pub fn init_logging(config: &AppConfig) {
    let log_level = config.effective_log_level().parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
