//! Error types for the RBAC engine

use modbot_store::{AccountId, StoreError};
use thiserror::Error;

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;

/// Errors internal to the RBAC engine.
///
/// These never cross the facade boundary: every public engine and facade
/// method converts failures into the operation's safe default.
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("role not found: {0}")]
    RoleNotFound(String),

    #[error("principal not found: {0}")]
    PrincipalNotFound(AccountId),

    #[error(transparent)]
    Store(#[from] StoreError),
}
