use crate::utils::config::LoggingConfig;
use std::path::Path;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set; JSON output is meant
/// for unattended watch-mode deployments, pretty output for a terminal.
pub fn init_logger(level: &str, json_output: bool, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match (json_output, log_file) {
        (true, Some(path)) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("Failed to open log file");
            registry.with(fmt::layer().json().with_writer(file)).init();
        }
        (true, None) => registry.with(fmt::layer().json()).init(),
        (false, _) => registry.with(fmt::layer().pretty().with_target(false)).init(),
    }
}

/// Initialize logger from config
pub fn init_from_config(config: &LoggingConfig) {
    let log_file = match config.file_path.as_str() {
        "" => None,
        path => Some(Path::new(path)),
    };
    init_logger(&config.level, config.output == "json", log_file);
}
