//! Error types for the extension subsystem

use thiserror::Error;

/// Result type for extension operations
pub type Result<T> = std::result::Result<T, ExtensionError>;

/// Errors that can occur while managing extensions
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("failed to construct extension {id}: {reason}")]
    Construction { id: String, reason: String },

    #[error("extension not found: {0}")]
    NotFound(String),

    #[error("extension discovery failed: {0}")]
    Discovery(String),

    #[error("invalid extension manifest at {path}: {reason}")]
    Manifest { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtensionError {
    /// A factory failure for one extension.
    pub fn construction(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Construction {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}
