//! The `AuthStore` trait — the persistence boundary of the subsystem
//!
//! Each method is one atomic transaction: implementations must make the
//! multi-step operations (`ensure_user`, `assign_role`,
//! `replace_role_permissions`) check-and-write under the same lock or
//! transaction so concurrent callers cannot create duplicate rows or edges.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::records::{
    AccountId, AuditLogRecord, NewUser, PermissionId, PermissionRecord, RoleId, RoleRecord,
    UserId, UserPatch, UserRecord,
};

/// Edge-table sizes, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeCounts {
    pub user_roles: u64,
    pub role_permissions: u64,
}

/// Per-role graph counts, for operator views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleStats {
    pub role: RoleRecord,
    pub permission_count: u64,
    pub member_count: u64,
}

/// Transactional access to the authorization tables.
#[async_trait]
pub trait AuthStore: Send + Sync {
    // --- users ---

    /// Look up a user by external account id.
    async fn user_by_account(&self, account_id: AccountId) -> Result<Option<UserRecord>>;

    /// Create the user if absent, otherwise update changed profile fields.
    /// The legacy role column is never changed by this call. Returns the
    /// record and whether it was created.
    async fn ensure_user(&self, new: NewUser) -> Result<(UserRecord, bool)>;

    /// Apply a partial update to an existing user.
    async fn update_user(&self, account_id: AccountId, patch: UserPatch) -> Result<UserRecord>;

    /// Delete a user and their role edges. Returns false when absent.
    async fn delete_user(&self, account_id: AccountId) -> Result<bool>;

    /// Total number of users.
    async fn user_count(&self) -> Result<u64>;

    /// User counts grouped by the legacy role column.
    async fn users_by_role(&self) -> Result<HashMap<String, u64>>;

    /// Every user, for operator views.
    async fn all_users(&self) -> Result<Vec<UserRecord>>;

    // --- roles and permissions ---

    /// Insert a permission unless one with the same name exists; returns the
    /// stored record either way.
    async fn permission_if_absent(
        &self,
        name: &str,
        description: &str,
        category: &str,
    ) -> Result<PermissionRecord>;

    /// Insert a role unless one with the same name exists; returns the
    /// stored record either way.
    async fn role_if_absent(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
    ) -> Result<RoleRecord>;

    /// Look up a role by name.
    async fn role_by_name(&self, name: &str) -> Result<Option<RoleRecord>>;

    /// Every role.
    async fn all_roles(&self) -> Result<Vec<RoleRecord>>;

    /// Every permission.
    async fn all_permissions(&self) -> Result<Vec<PermissionRecord>>;

    /// Resolve permission names to ids; unknown names are skipped.
    async fn permission_ids_by_names(&self, names: &[String]) -> Result<Vec<PermissionId>>;

    /// Replace a role's entire permission-edge set in one transaction
    /// (delete existing edges, insert the given set).
    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<()>;

    // --- graph ---

    /// Names of the roles a user holds.
    async fn role_names_for_user(&self, user_id: UserId) -> Result<Vec<String>>;

    /// Ids of the roles a user holds.
    async fn role_ids_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>>;

    /// Union of permission names reachable from the given roles.
    async fn permission_names_for_roles(&self, role_ids: &[RoleId]) -> Result<HashSet<String>>;

    /// Add a user→role edge. Returns false (no write) when the edge already
    /// exists; fails when the user or role row is missing.
    async fn assign_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool>;

    /// Remove a user→role edge. Returns false when no such edge existed.
    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool>;

    /// Users currently holding a role.
    async fn users_with_role(&self, role_id: RoleId) -> Result<Vec<UserRecord>>;

    /// Edge-table sizes.
    async fn edge_counts(&self) -> Result<EdgeCounts>;

    /// Per-role permission and member counts.
    async fn role_stats(&self) -> Result<Vec<RoleStats>>;

    // --- audit ---

    /// Append an audit record. Never mutates existing entries.
    async fn append_audit(&self, record: AuditLogRecord) -> Result<()>;

    /// The audit log, oldest first.
    async fn audit_log(&self) -> Result<Vec<AuditLogRecord>>;
}
