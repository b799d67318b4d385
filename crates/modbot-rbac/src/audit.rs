//! Best-effort audit recording
//!
//! Audit is observability, not a guard: a failed write is logged and the
//! business operation it described still succeeds.

use std::sync::Arc;

use tracing::warn;

use modbot_store::{AuditLogRecord, AuthStore};

/// Actor name used for engine-internal operations.
pub const SYSTEM_ACTOR: &str = "system";

/// Audit action names written by the engine.
pub mod actions {
    pub const RBAC_SEEDED: &str = "rbac.seeded";
    pub const ROLE_ASSIGNED: &str = "role.assigned";
    pub const ROLE_REMOVED: &str = "role.removed";
    pub const LEGACY_ADMIN_SYNCED: &str = "legacy_admin.synced";
    pub const ADMIN_REVOKED: &str = "admin.revoked";
}

/// Writes audit records through the store, swallowing failures.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuthStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    /// Append a record; failures are logged and dropped.
    pub async fn record(&self, record: AuditLogRecord) {
        let action = record.action.clone();
        if let Err(err) = self.store.append_audit(record).await {
            warn!(%action, error = %err, "audit write failed");
        }
    }
}
