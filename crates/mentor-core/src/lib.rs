//! Mentor Core
//!
//! This crate provides the shared foundation for the mentor runtime:
//! error handling, configuration loading, and logging setup.

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{load_config, load_config_or_default, MentorConfig, RequestSettings};
pub use error::{MentorError, Result};
pub use logging::{init_logging, LogConfig};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_functionality() {
        // Smoke test - verify module exports are accessible
        let config = MentorConfig::default();
        assert_eq!(config.request.max_concurrent, 1);
    }
}
