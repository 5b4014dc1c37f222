//! Error types for the mentor runtime
//!
//! Only configuration loading can fail at this layer. Each higher crate
//! defines its own error enum and chains downward with `#[from]`.

/// Result type alias for mentor-core operations
pub type Result<T> = std::result::Result<T, MentorError>;

/// Errors produced while loading runtime configuration
#[derive(Debug, thiserror::Error)]
pub enum MentorError {
    /// Missing file or unusable values
    #[error("Configuration error: {0}")]
    Config(String),

    /// The config source could not be read or deserialized
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] config::ConfigError),
}

impl MentorError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
