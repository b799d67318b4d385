//! Row types for the authorization tables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal row id of a user.
pub type UserId = i64;
/// Stable external identity a principal is known by (e.g. a messenger
/// account id). This is what the rest of the application passes around.
pub type AccountId = i64;
/// Internal row id of a role.
pub type RoleId = i64;
/// Internal row id of a permission.
pub type PermissionId = i64;

/// A principal known to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub account_id: AccountId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Legacy single-role column kept for display fallbacks; real
    /// authorization flows through the role graph.
    pub role: String,
    pub is_admin: bool,
}

/// Fields for creating a user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub account_id: AccountId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl NewUser {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }
}

/// Partial update for a user; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
}

/// A named bundle of permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// An atomic, named capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit record. Never mutated once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogRecord {
    pub id: Uuid,
    /// Internal user row the action touched, when known.
    pub user_id: Option<UserId>,
    /// Who performed the action ("system" for engine-internal operations).
    pub actor: String,
    /// Dotted action name, e.g. `role.assigned`.
    pub action: String,
    /// Kind of resource acted on: user, role, extension, system.
    pub resource_type: String,
    pub resource_id: Option<i64>,
    /// Free-form JSON payload describing the action.
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLogRecord {
    /// Create a record with a fresh id and timestamp.
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            actor: actor.into(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            details: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_resource_id(mut self, resource_id: i64) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_builder() {
        let user = NewUser::new(42)
            .with_username("alice")
            .with_name("Alice", "Smith");
        assert_eq!(user.account_id, 42);
        assert_eq!(user.username.as_deref(), Some("alice"));
        assert_eq!(user.first_name.as_deref(), Some("Alice"));
        assert_eq!(user.last_name.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_audit_record_builder() {
        let record = AuditLogRecord::new("system", "role.assigned", "role")
            .with_user(1)
            .with_resource_id(3)
            .with_details(serde_json::json!({"role": "admin"}));
        assert_eq!(record.actor, "system");
        assert_eq!(record.user_id, Some(1));
        assert_eq!(record.resource_id, Some(3));
        assert_eq!(record.details["role"], "admin");
    }

    #[test]
    fn test_audit_record_serialization() {
        let record = AuditLogRecord::new("7", "role.removed", "role");
        let json = serde_json::to_string(&record).unwrap();
        let back: AuditLogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, "role.removed");
        assert_eq!(back.id, record.id);
    }
}
