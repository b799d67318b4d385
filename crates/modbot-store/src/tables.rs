//! In-memory relational state shared by the store backends
//!
//! All invariants live here: unique user accounts, unique role and
//! permission names, unique edges, and referential integrity on edge
//! inserts. Backends wrap this struct in a lock and (for the file backend)
//! persist a snapshot after each write.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::records::{
    AccountId, AuditLogRecord, NewUser, PermissionId, PermissionRecord, RoleId, RoleRecord,
    UserId, UserPatch, UserRecord,
};
use crate::store::{EdgeCounts, RoleStats};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub(crate) struct Tables {
    users: Vec<UserRecord>,
    roles: Vec<RoleRecord>,
    permissions: Vec<PermissionRecord>,
    user_roles: Vec<(UserId, RoleId)>,
    role_permissions: Vec<(RoleId, PermissionId)>,
    audit_logs: Vec<AuditLogRecord>,
    next_user_id: UserId,
    next_role_id: RoleId,
    next_permission_id: PermissionId,
}

impl Tables {
    // --- users ---

    pub fn user_by_account(&self, account_id: AccountId) -> Option<UserRecord> {
        self.users
            .iter()
            .find(|u| u.account_id == account_id)
            .cloned()
    }

    pub fn user_by_id(&self, user_id: UserId) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn ensure_user(&mut self, new: NewUser) -> (UserRecord, bool) {
        if let Some(user) = self.users.iter_mut().find(|u| u.account_id == new.account_id) {
            if new.username.is_some() && user.username != new.username {
                user.username = new.username;
            }
            if new.first_name.is_some() && user.first_name != new.first_name {
                user.first_name = new.first_name;
            }
            if new.last_name.is_some() && user.last_name != new.last_name {
                user.last_name = new.last_name;
            }
            return (user.clone(), false);
        }

        self.next_user_id += 1;
        let user = UserRecord {
            id: self.next_user_id,
            account_id: new.account_id,
            username: new.username,
            first_name: new.first_name,
            last_name: new.last_name,
            role: "user".to_string(),
            is_admin: false,
        };
        self.users.push(user.clone());
        (user, true)
    }

    pub fn update_user(&mut self, account_id: AccountId, patch: UserPatch) -> Result<UserRecord> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.account_id == account_id)
            .ok_or_else(|| StoreError::not_found("user", account_id))?;

        if let Some(username) = patch.username {
            user.username = Some(username);
        }
        if let Some(first_name) = patch.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(role) = patch.role {
            user.is_admin = role == "admin";
            user.role = role;
        }
        Ok(user.clone())
    }

    pub fn delete_user(&mut self, account_id: AccountId) -> bool {
        let Some(index) = self.users.iter().position(|u| u.account_id == account_id) else {
            return false;
        };
        let user_id = self.users[index].id;
        self.users.remove(index);
        self.user_roles.retain(|(uid, _)| *uid != user_id);
        true
    }

    pub fn user_count(&self) -> u64 {
        self.users.len() as u64
    }

    pub fn users_by_role(&self) -> HashMap<String, u64> {
        let mut counts = HashMap::new();
        for user in &self.users {
            *counts.entry(user.role.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn all_users(&self) -> Vec<UserRecord> {
        self.users.clone()
    }

    // --- roles and permissions ---

    pub fn permission_if_absent(
        &mut self,
        name: &str,
        description: &str,
        category: &str,
    ) -> PermissionRecord {
        if let Some(existing) = self.permissions.iter().find(|p| p.name == name) {
            return existing.clone();
        }
        self.next_permission_id += 1;
        let record = PermissionRecord {
            id: self.next_permission_id,
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            created_at: Utc::now(),
        };
        self.permissions.push(record.clone());
        record
    }

    pub fn role_if_absent(
        &mut self,
        name: &str,
        description: &str,
        is_default: bool,
    ) -> RoleRecord {
        if let Some(existing) = self.roles.iter().find(|r| r.name == name) {
            return existing.clone();
        }
        self.next_role_id += 1;
        let record = RoleRecord {
            id: self.next_role_id,
            name: name.to_string(),
            description: description.to_string(),
            is_default,
            created_at: Utc::now(),
        };
        self.roles.push(record.clone());
        record
    }

    pub fn role_by_name(&self, name: &str) -> Option<RoleRecord> {
        self.roles.iter().find(|r| r.name == name).cloned()
    }

    pub fn role_by_id(&self, role_id: RoleId) -> Option<&RoleRecord> {
        self.roles.iter().find(|r| r.id == role_id)
    }

    pub fn all_roles(&self) -> Vec<RoleRecord> {
        self.roles.clone()
    }

    pub fn all_permissions(&self) -> Vec<PermissionRecord> {
        self.permissions.clone()
    }

    pub fn permission_ids_by_names(&self, names: &[String]) -> Vec<PermissionId> {
        names
            .iter()
            .filter_map(|name| {
                self.permissions
                    .iter()
                    .find(|p| &p.name == name)
                    .map(|p| p.id)
            })
            .collect()
    }

    pub fn replace_role_permissions(
        &mut self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<()> {
        if self.role_by_id(role_id).is_none() {
            return Err(StoreError::not_found("role", role_id));
        }
        for pid in permission_ids {
            if !self.permissions.iter().any(|p| p.id == *pid) {
                return Err(StoreError::not_found("permission", pid));
            }
        }

        self.role_permissions.retain(|(rid, _)| *rid != role_id);
        let mut seen = HashSet::new();
        for pid in permission_ids {
            if seen.insert(*pid) {
                self.role_permissions.push((role_id, *pid));
            }
        }
        Ok(())
    }

    // --- graph ---

    pub fn role_ids_for_user(&self, user_id: UserId) -> Vec<RoleId> {
        self.user_roles
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, rid)| *rid)
            .collect()
    }

    pub fn role_names_for_user(&self, user_id: UserId) -> Vec<String> {
        self.role_ids_for_user(user_id)
            .into_iter()
            .filter_map(|rid| self.role_by_id(rid).map(|r| r.name.clone()))
            .collect()
    }

    pub fn permission_names_for_roles(&self, role_ids: &[RoleId]) -> HashSet<String> {
        let wanted: HashSet<RoleId> = role_ids.iter().copied().collect();
        self.role_permissions
            .iter()
            .filter(|(rid, _)| wanted.contains(rid))
            .filter_map(|(_, pid)| {
                self.permissions
                    .iter()
                    .find(|p| p.id == *pid)
                    .map(|p| p.name.clone())
            })
            .collect()
    }

    pub fn assign_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        if self.user_by_id(user_id).is_none() {
            return Err(StoreError::not_found("user", user_id));
        }
        if self.role_by_id(role_id).is_none() {
            return Err(StoreError::not_found("role", role_id));
        }
        if self.user_roles.contains(&(user_id, role_id)) {
            return Ok(false);
        }
        self.user_roles.push((user_id, role_id));
        Ok(true)
    }

    pub fn remove_role(&mut self, user_id: UserId, role_id: RoleId) -> bool {
        let before = self.user_roles.len();
        self.user_roles
            .retain(|edge| *edge != (user_id, role_id));
        self.user_roles.len() != before
    }

    pub fn users_with_role(&self, role_id: RoleId) -> Vec<UserRecord> {
        self.user_roles
            .iter()
            .filter(|(_, rid)| *rid == role_id)
            .filter_map(|(uid, _)| self.user_by_id(*uid).cloned())
            .collect()
    }

    pub fn edge_counts(&self) -> EdgeCounts {
        EdgeCounts {
            user_roles: self.user_roles.len() as u64,
            role_permissions: self.role_permissions.len() as u64,
        }
    }

    pub fn role_stats(&self) -> Vec<RoleStats> {
        self.roles
            .iter()
            .map(|role| RoleStats {
                role: role.clone(),
                permission_count: self
                    .role_permissions
                    .iter()
                    .filter(|(rid, _)| *rid == role.id)
                    .count() as u64,
                member_count: self
                    .user_roles
                    .iter()
                    .filter(|(_, rid)| *rid == role.id)
                    .count() as u64,
            })
            .collect()
    }

    // --- audit ---

    pub fn append_audit(&mut self, record: AuditLogRecord) {
        self.audit_logs.push(record);
    }

    pub fn audit_log(&self) -> Vec<AuditLogRecord> {
        self.audit_logs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_user_creates_then_updates() {
        let mut tables = Tables::default();

        let (user, created) = tables.ensure_user(NewUser::new(42).with_username("alice"));
        assert!(created);
        assert_eq!(user.role, "user");
        assert!(!user.is_admin);

        let (user, created) = tables.ensure_user(NewUser::new(42).with_username("alice2"));
        assert!(!created);
        assert_eq!(user.username.as_deref(), Some("alice2"));
        assert_eq!(tables.user_count(), 1);
    }

    #[test]
    fn test_ensure_user_never_touches_role() {
        let mut tables = Tables::default();
        tables.ensure_user(NewUser::new(42));
        tables
            .update_user(
                42,
                UserPatch {
                    role: Some("admin".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let (user, _) = tables.ensure_user(NewUser::new(42).with_username("alice"));
        assert_eq!(user.role, "admin");
        assert!(user.is_admin);
    }

    #[test]
    fn test_assign_role_enforces_integrity() {
        let mut tables = Tables::default();
        let (user, _) = tables.ensure_user(NewUser::new(1));

        let missing_role = tables.assign_role(user.id, 99);
        assert!(matches!(
            missing_role,
            Err(StoreError::NotFound { entity: "role", .. })
        ));

        let role = tables.role_if_absent("admin", "", false);
        let missing_user = tables.assign_role(999, role.id);
        assert!(matches!(
            missing_user,
            Err(StoreError::NotFound { entity: "user", .. })
        ));
    }

    #[test]
    fn test_assign_role_is_idempotent() {
        let mut tables = Tables::default();
        let (user, _) = tables.ensure_user(NewUser::new(1));
        let role = tables.role_if_absent("admin", "", false);

        assert!(tables.assign_role(user.id, role.id).unwrap());
        assert!(!tables.assign_role(user.id, role.id).unwrap());
        assert_eq!(tables.edge_counts().user_roles, 1);
    }

    #[test]
    fn test_remove_role_missing_edge_is_noop() {
        let mut tables = Tables::default();
        let (user, _) = tables.ensure_user(NewUser::new(1));
        let role = tables.role_if_absent("admin", "", false);

        assert!(!tables.remove_role(user.id, role.id));
        tables.assign_role(user.id, role.id).unwrap();
        assert!(tables.remove_role(user.id, role.id));
        assert!(!tables.remove_role(user.id, role.id));
    }

    #[test]
    fn test_replace_role_permissions_converges() {
        let mut tables = Tables::default();
        let role = tables.role_if_absent("admin", "", false);
        let p1 = tables.permission_if_absent("user.view", "", "user_management");
        let p2 = tables.permission_if_absent("user.delete", "", "user_management");

        tables
            .replace_role_permissions(role.id, &[p1.id, p2.id])
            .unwrap();
        assert_eq!(tables.edge_counts().role_permissions, 2);

        // re-seeding with a smaller set removes the stale edge
        tables.replace_role_permissions(role.id, &[p2.id]).unwrap();
        let names = tables.permission_names_for_roles(&[role.id]);
        assert_eq!(names.len(), 1);
        assert!(names.contains("user.delete"));
    }

    #[test]
    fn test_replace_role_permissions_dedupes() {
        let mut tables = Tables::default();
        let role = tables.role_if_absent("admin", "", false);
        let p1 = tables.permission_if_absent("user.view", "", "user_management");

        tables
            .replace_role_permissions(role.id, &[p1.id, p1.id])
            .unwrap();
        assert_eq!(tables.edge_counts().role_permissions, 1);
    }

    #[test]
    fn test_delete_user_cascades_edges() {
        let mut tables = Tables::default();
        let (user, _) = tables.ensure_user(NewUser::new(1));
        let role = tables.role_if_absent("admin", "", false);
        tables.assign_role(user.id, role.id).unwrap();

        assert!(tables.delete_user(1));
        assert_eq!(tables.edge_counts().user_roles, 0);
        assert!(!tables.delete_user(1));
    }

    #[test]
    fn test_permission_if_absent_keeps_original() {
        let mut tables = Tables::default();
        let first = tables.permission_if_absent("user.view", "original", "user_management");
        let second = tables.permission_if_absent("user.view", "changed", "system");
        assert_eq!(first.id, second.id);
        assert_eq!(second.description, "original");
    }

    #[test]
    fn test_role_stats() {
        let mut tables = Tables::default();
        let (user, _) = tables.ensure_user(NewUser::new(1));
        let role = tables.role_if_absent("admin", "", false);
        let perm = tables.permission_if_absent("user.view", "", "user_management");
        tables.replace_role_permissions(role.id, &[perm.id]).unwrap();
        tables.assign_role(user.id, role.id).unwrap();

        let stats = tables.role_stats();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].permission_count, 1);
        assert_eq!(stats[0].member_count, 1);
    }
}
