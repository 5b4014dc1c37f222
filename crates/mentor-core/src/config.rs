//! Configuration management for the mentor runtime
//!
//! This module provides configuration loading from multiple sources:
//! - Default values
//! - Configuration files (TOML, JSON, YAML)
//! - Environment variables

use crate::error::{MentorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the mentor runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentorConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Request manager settings
    #[serde(default)]
    pub request: RequestSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

/// Request manager settings
///
/// These feed the Request Manager's runtime limits. The defaults serialize
/// all backend traffic through a single in-flight slot, which is the
/// intended backpressure posture against a rate-limited generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSettings {
    /// Maximum number of simultaneously in-flight generation calls
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry attempts after the first failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Response cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_concurrent() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_cache_ttl_secs() -> u64 {
    300
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSettings::default(),
            request: RequestSettings::default(),
        }
    }
}

/// Load configuration from a file
///
/// Supports TOML, JSON, and YAML formats based on file extension.
/// Environment variables prefixed with `MENTOR` override file values.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<MentorConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MentorError::config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("MENTOR").separator("__"))
        .build()?;

    let config: MentorConfig = settings.try_deserialize()?;

    tracing::info!("Configuration loaded from {}", path.display());

    Ok(config)
}

/// Load configuration with defaults if the file doesn't exist
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> MentorConfig {
    match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            MentorConfig::default()
        }
    }
}
