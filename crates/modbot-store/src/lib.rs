//! Authorization store for modbot
//!
//! Owns durability for the role/permission graph: the `users`, `roles`,
//! `permissions`, `role_permissions`, `user_roles` and `audit_logs` tables.
//! Backends implement [`AuthStore`]; every trait method is one atomic
//! transaction, so multi-step invariants (unique edges, delete-then-insert
//! permission replacement) hold under concurrent callers.

pub mod di;
pub mod error;
pub mod file;
pub mod memory;
pub mod records;
pub mod store;

mod tables;

pub use error::{Result, StoreError};
pub use file::FileAuthStore;
pub use memory::MemoryAuthStore;
pub use records::{
    AccountId, AuditLogRecord, NewUser, PermissionId, PermissionRecord, RoleId, RoleRecord,
    UserId, UserPatch, UserRecord,
};
pub use store::{AuthStore, EdgeCounts, RoleStats};
