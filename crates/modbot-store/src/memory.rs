//! In-memory store backend
//!
//! The default backend for tests and ephemeral deployments. A single
//! `RwLock` around the tables makes every trait method one atomic
//! transaction.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::records::{
    AccountId, AuditLogRecord, NewUser, PermissionId, PermissionRecord, RoleId, RoleRecord,
    UserId, UserPatch, UserRecord,
};
use crate::store::{AuthStore, EdgeCounts, RoleStats};
use crate::tables::Tables;

/// Authorization store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryAuthStore {
    tables: RwLock<Tables>,
}

impl MemoryAuthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthStore for MemoryAuthStore {
    async fn user_by_account(&self, account_id: AccountId) -> Result<Option<UserRecord>> {
        Ok(self.tables.read().await.user_by_account(account_id))
    }

    async fn ensure_user(&self, new: NewUser) -> Result<(UserRecord, bool)> {
        Ok(self.tables.write().await.ensure_user(new))
    }

    async fn update_user(&self, account_id: AccountId, patch: UserPatch) -> Result<UserRecord> {
        self.tables.write().await.update_user(account_id, patch)
    }

    async fn delete_user(&self, account_id: AccountId) -> Result<bool> {
        Ok(self.tables.write().await.delete_user(account_id))
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
        Ok(self
            .tables
            .write()
            .await
            .permission_if_absent(name, description, category))
    }

    async fn role_if_absent(
        &self,
        name: &str,
        description: &str,
        is_default: bool,
    ) -> Result<RoleRecord> {
        Ok(self
            .tables
            .write()
            .await
            .role_if_absent(name, description, is_default))
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
        self.tables
            .write()
            .await
            .replace_role_permissions(role_id, permission_ids)
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
        self.tables.write().await.assign_role(user_id, role_id)
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        Ok(self.tables.write().await.remove_role(user_id, role_id))
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
        self.tables.write().await.append_audit(record);
        Ok(())
    }

    async fn audit_log(&self) -> Result<Vec<AuditLogRecord>> {
        Ok(self.tables.read().await.audit_log())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_round_trip() {
        let store = MemoryAuthStore::new();
        let (user, created) = store
            .ensure_user(NewUser::new(42).with_username("alice"))
            .await
            .unwrap();
        assert!(created);

        let found = store.user_by_account(42).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(store.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_assign_role_concurrent_is_single_edge() {
        use std::sync::Arc;

        let store = Arc::new(MemoryAuthStore::new());
        let (user, _) = store.ensure_user(NewUser::new(1)).await.unwrap();
        let role = store.role_if_absent("admin", "", false).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let (uid, rid) = (user.id, role.id);
            handles.push(tokio::spawn(
                async move { store.assign_role(uid, rid).await },
            ));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.edge_counts().await.unwrap().user_roles, 1);
    }

    #[tokio::test]
    async fn test_user_bookkeeping() {
        let store = MemoryAuthStore::new();
        store
            .ensure_user(NewUser::new(1).with_username("alice"))
            .await
            .unwrap();
        store.ensure_user(NewUser::new(2)).await.unwrap();

        store
            .update_user(
                2,
                UserPatch {
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let by_role = store.users_by_role().await.unwrap();
        assert_eq!(by_role.get("user"), Some(&1));
        assert_eq!(by_role.get("admin"), Some(&1));

        let all = store.all_users().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|u| u.account_id == 2 && u.is_admin));

        assert!(store.delete_user(1).await.unwrap());
        assert_eq!(store.user_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_audit_append_only() {
        let store = MemoryAuthStore::new();
        store
            .append_audit(AuditLogRecord::new("system", "rbac.seeded", "system"))
            .await
            .unwrap();
        store
            .append_audit(AuditLogRecord::new("7", "role.assigned", "role"))
            .await
            .unwrap();

        let log = store.audit_log().await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, "rbac.seeded");
        assert_eq!(log[1].action, "role.assigned");
    }
}
