//! The authorization facade
//!
//! The single entry point the rest of the host calls. Every method is a
//! direct, non-caching delegation to the engine; the only contract is
//! stability of this narrow surface, so callers never depend on engine
//! internals. Nothing here returns an error.

use std::sync::Arc;

use modbot_store::AccountId;

use crate::engine::RbacEngine;
use crate::roles::ADMIN;

/// Narrow authorization surface for request-handling code.
#[derive(Clone)]
pub struct AuthFacade {
    engine: Arc<RbacEngine>,
}

impl AuthFacade {
    pub fn new(engine: Arc<RbacEngine>) -> Self {
        Self { engine }
    }

    /// Whether the principal is an administrator.
    pub async fn is_admin(&self, principal: AccountId) -> bool {
        self.engine.is_admin(principal).await
    }

    /// Whether the principal holds the named permission.
    pub async fn check_permission(&self, principal: AccountId, permission: &str) -> bool {
        self.engine.user_has_permission(principal, permission).await
    }

    /// Names of the roles the principal holds.
    pub async fn get_user_roles(&self, principal: AccountId) -> Vec<String> {
        self.engine.get_user_roles(principal).await
    }

    /// Whether the principal explicitly holds the named role.
    pub async fn user_has_role(&self, principal: AccountId, role: &str) -> bool {
        self.engine.user_has_role(principal, role).await
    }

    /// Grant the `admin` role.
    pub async fn assign_admin_role(&self, principal: AccountId) -> bool {
        self.engine.assign_role_to_user(principal, ADMIN).await
    }

    /// Revoke the `admin` role.
    pub async fn remove_admin_role(&self, principal: AccountId) -> bool {
        self.engine.remove_user_role(principal, ADMIN).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RbacOptions;
    use modbot_store::{MemoryAuthStore, NewUser};

    async fn facade() -> AuthFacade {
        let engine = Arc::new(RbacEngine::new(
            Arc::new(MemoryAuthStore::new()),
            RbacOptions::default(),
        ));
        engine.seed_default_roles().await.unwrap();
        engine.store().ensure_user(NewUser::new(42)).await.unwrap();
        AuthFacade::new(engine)
    }

    #[tokio::test]
    async fn test_admin_round_trip() {
        let facade = facade().await;

        assert!(!facade.is_admin(42).await);
        assert!(facade.assign_admin_role(42).await);
        assert!(facade.is_admin(42).await);
        assert!(facade.user_has_role(42, ADMIN).await);
        assert!(facade.check_permission(42, "admin.panel.access").await);

        assert!(facade.remove_admin_role(42).await);
        assert!(!facade.is_admin(42).await);
    }

    #[tokio::test]
    async fn test_safe_defaults_for_unknown_principal() {
        let facade = facade().await;

        assert!(!facade.is_admin(999).await);
        assert!(!facade.check_permission(999, "user.view").await);
        assert_eq!(facade.get_user_roles(999).await, vec!["user".to_string()]);
    }
}
