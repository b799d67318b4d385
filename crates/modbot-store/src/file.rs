//! File-backed store backend
//!
//! Keeps the tables in memory and writes a JSON snapshot after every write
//! transaction. Loading tolerates a missing file so first startup works on
//! an empty directory.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::records::{
    AccountId, AuditLogRecord, NewUser, PermissionId, PermissionRecord, RoleId, RoleRecord,
    UserId, UserPatch, UserRecord,
};
use crate::store::{AuthStore, EdgeCounts, RoleStats};
use crate::tables::Tables;

/// Authorization store persisted to a JSON snapshot file.
pub struct FileAuthStore {
    path: PathBuf,
    tables: RwLock<Tables>,
}

impl FileAuthStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            Tables::default()
        };
        debug!(path = %path.display(), "authorization store opened");
        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    async fn persist(&self, tables: &Tables) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(tables)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthStore for FileAuthStore {
    async fn user_by_account(&self, account_id: AccountId) -> Result<Option<UserRecord>> {
        Ok(self.tables.read().await.user_by_account(account_id))
    }

    async fn ensure_user(&self, new: NewUser) -> Result<(UserRecord, bool)> {
        let mut tables = self.tables.write().await;
        let result = tables.ensure_user(new);
        self.persist(&tables).await?;
        Ok(result)
    }

    async fn update_user(&self, account_id: AccountId, patch: UserPatch) -> Result<UserRecord> {
        let mut tables = self.tables.write().await;
        let user = tables.update_user(account_id, patch)?;
        self.persist(&tables).await?;
        Ok(user)
    }

    async fn delete_user(&self, account_id: AccountId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let deleted = tables.delete_user(account_id);
        if deleted {
            self.persist(&tables).await?;
        }
        Ok(deleted)
    }

    async fn user_count(&self) -> Result<u64> {
        Ok(self.tables.read().await.user_count())
    }

    async fn users_by_role(&self) -> Result<HashMap<String, u64>> {
        Ok(self.tables.read().await.users_by_role())
    }

    async fn all_users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.tables.read().await.all_users())
    }

    async fn permission_if_absent(
        &self,
        name: &str,
        description: &str,
        category: &str,
    ) -> Result<PermissionRecord> {
        let mut tables = self.tables.write().await;
        let record = tables.permission_if_absent(name, description, category);
        self.persist(&tables).await?;
        Ok(record)
    }

    async fn role_if_absent(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
    ) -> Result<RoleRecord> {
        let mut tables = self.tables.write().await;
        let record = tables.role_if_absent(name, description, is_default);
        self.persist(&tables).await?;
        Ok(record)
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<RoleRecord>> {
        Ok(self.tables.read().await.role_by_name(name))
    }

    async fn all_roles(&self) -> Result<Vec<RoleRecord>> {
        Ok(self.tables.read().await.all_roles())
    }

    async fn all_permissions(&self) -> Result<Vec<PermissionRecord>> {
        Ok(self.tables.read().await.all_permissions())
    }

    async fn permission_ids_by_names(&self, names: &[String]) -> Result<Vec<PermissionId>> {
        Ok(self.tables.read().await.permission_ids_by_names(names))
    }

    async fn replace_role_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.replace_role_permissions(role_id, permission_ids)?;
        self.persist(&tables).await
    }

    async fn role_names_for_user(&self, user_id: UserId) -> Result<Vec<String>> {
        Ok(self.tables.read().await.role_names_for_user(user_id))
    }

    async fn role_ids_for_user(&self, user_id: UserId) -> Result<Vec<RoleId>> {
        Ok(self.tables.read().await.role_ids_for_user(user_id))
    }

    async fn permission_names_for_roles(&self, role_ids: &[RoleId]) -> Result<HashSet<String>> {
        Ok(self
            .tables
            .read()
            .await
            .permission_names_for_roles(role_ids))
    }

    async fn assign_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let inserted = tables.assign_role(user_id, role_id)?;
        if inserted {
            self.persist(&tables).await?;
        }
        Ok(inserted)
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.remove_role(user_id, role_id);
        if removed {
            self.persist(&tables).await?;
        }
        Ok(removed)
    }

    async fn users_with_role(&self, role_id: RoleId) -> Result<Vec<UserRecord>> {
        Ok(self.tables.read().await.users_with_role(role_id))
    }

    async fn edge_counts(&self) -> Result<EdgeCounts> {
        Ok(self.tables.read().await.edge_counts())
    }

    async fn role_stats(&self) -> Result<Vec<RoleStats>> {
        Ok(self.tables.read().await.role_stats())
    }

    async fn append_audit(&self, record: AuditLogRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.append_audit(record);
        self.persist(&tables).await
    }

    async fn audit_log(&self) -> Result<Vec<AuditLogRecord>> {
        Ok(self.tables.read().await.audit_log())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAuthStore::open(dir.path().join("auth.json"))
            .await
            .unwrap();
        assert_eq!(store.user_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");

        {
            let store = FileAuthStore::open(&path).await.unwrap();
            let (user, _) = store
                .ensure_user(NewUser::new(42).with_username("alice"))
                .await
                .unwrap();
            let role = store.role_if_absent("admin", "", false).await.unwrap();
            store.assign_role(user.id, role.id).await.unwrap();
        }

        let reopened = FileAuthStore::open(&path).await.unwrap();
        let user = reopened.user_by_account(42).await.unwrap().unwrap();
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(
            reopened.role_names_for_user(user.id).await.unwrap(),
            vec!["admin".to_string()]
        );
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("auth.json");
        let store = FileAuthStore::open(&path).await.unwrap();
        store.ensure_user(NewUser::new(1)).await.unwrap();
        assert!(path.exists());
    }
}
