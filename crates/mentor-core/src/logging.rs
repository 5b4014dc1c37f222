//! Logging setup for the mentor runtime
//!
//! Wraps `tracing-subscriber` initialization so binaries only hand over the
//! `LoggingSettings` they already loaded from configuration.

use crate::config::LoggingSettings;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level ("info", "debug", "trace")
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl From<&LoggingSettings> for LogConfig {
    fn from(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.clone(),
            json: settings.json,
        }
    }
}

/// Filter directives derived from the base level
///
/// The HTTP stack logs every connection event at debug; cap it at warn so
/// debug-level runs still read as request-manager traffic.
fn directives(level: &str) -> String {
    format!("{},hyper=warn,reqwest=warn", level)
}

/// Initialize the global tracing subscriber
///
/// Call once at startup. A `RUST_LOG` value overrides the configured level
/// and the built-in directives wholesale.
pub fn init_logging(config: LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(&config.level)));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    }

    tracing::info!(level = %config.level, json = config.json, "logging ready");
}
