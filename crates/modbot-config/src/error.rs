//! Configuration error types

use thiserror::Error;

/// Configuration result type
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No config section for extension: {0}")]
    ExtensionSectionMissing(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
