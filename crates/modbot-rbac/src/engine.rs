//! The RBAC engine
//!
//! Owns seeding, legacy-admin reconciliation, and the principal → roles →
//! permissions resolution. Public query methods never surface an error:
//! permission checks fail closed (deny) and role queries fail open to the
//! configured default role, since permission checks gate dangerous actions
//! while role queries usually only render a label.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use modbot_config::Settings;
use modbot_store::{AccountId, AuditLogRecord, AuthStore, NewUser};

use crate::audit::{actions, AuditRecorder, SYSTEM_ACTOR};
use crate::cache::PermissionCache;
use crate::catalog::{catalog, PermissionDef};
use crate::error::{RbacError, Result};
use crate::roles::{canonical_roles, ADMIN, SUPER_ADMIN};

/// Engine configuration, extracted from [`Settings`].
#[derive(Debug, Clone)]
pub struct RbacOptions {
    /// Deployment-level kill switch; when false the role graph is bypassed.
    pub enabled: bool,
    /// Role reported for principals with no explicit role.
    pub default_role: String,
    /// Statically configured administrator identities, reconciled into the
    /// graph at startup.
    pub legacy_admin_ids: Vec<AccountId>,
}

impl Default for RbacOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            default_role: "user".to_string(),
            legacy_admin_ids: Vec::new(),
        }
    }
}

impl From<&Settings> for RbacOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            enabled: settings.rbac.enabled,
            default_role: settings.rbac.default_role.clone(),
            legacy_admin_ids: settings.admin_ids.clone(),
        }
    }
}

/// Best-effort snapshot of the role graph for operator views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RbacDiagnostics {
    pub enabled: bool,
    pub role_count: u64,
    pub permission_count: u64,
    pub user_count: u64,
    pub user_role_edges: u64,
    pub role_permission_edges: u64,
    pub roles: Vec<RoleDiagnostics>,
}

/// Per-role slice of [`RbacDiagnostics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDiagnostics {
    pub name: String,
    pub is_default: bool,
    pub permission_count: u64,
    pub member_count: u64,
}

/// Single source of truth for "who can do what".
pub struct RbacEngine {
    store: Arc<dyn AuthStore>,
    options: RbacOptions,
    catalog: Vec<PermissionDef>,
    audit: AuditRecorder,
    cache: PermissionCache,
}

impl RbacEngine {
    /// Create an engine over the compiled-in catalog.
    pub fn new(store: Arc<dyn AuthStore>, options: RbacOptions) -> Self {
        Self::with_catalog(store, options, catalog())
    }

    /// Create an engine over an explicit catalog. Lets tests model catalog
    /// evolution (renamed or removed permissions) across reseeds.
    pub fn with_catalog(
        store: Arc<dyn AuthStore>,
        options: RbacOptions,
        catalog: Vec<PermissionDef>,
    ) -> Self {
        let audit = AuditRecorder::new(Arc::clone(&store));
        Self {
            store,
            options,
            catalog,
            audit,
            cache: PermissionCache::default(),
        }
    }

    /// Handle to the underlying store.
    pub fn store(&self) -> Arc<dyn AuthStore> {
        Arc::clone(&self.store)
    }

    /// Engine configuration.
    pub fn options(&self) -> &RbacOptions {
        &self.options
    }

    /// Seed the catalog and reconcile legacy admins.
    ///
    /// Idempotent and safe to call on every process start. Fails soft: if
    /// the store is unreachable the host still starts, in degraded
    /// permission-closed mode.
    pub async fn initialize_system(&self) {
        if !self.options.enabled {
            info!("rbac disabled via configuration, skipping initialization");
            return;
        }
        if let Err(err) = self.seed_default_roles().await {
            error!(error = %err, "rbac seeding failed, continuing in permission-closed mode");
            return;
        }
        if let Err(err) = self.sync_legacy_admins().await {
            error!(error = %err, "legacy admin sync failed");
        }
    }

    /// Insert-if-absent every catalog permission, then converge the three
    /// canonical roles: the role row is created if missing and its
    /// permission-edge set is replaced (not merged) with the computed set.
    pub async fn seed_default_roles(&self) -> Result<()> {
        for def in &self.catalog {
            self.store
                .permission_if_absent(&def.name, &def.description, def.category.as_str())
                .await?;
        }

        for spec in canonical_roles() {
            let role = self
                .store
                .role_if_absent(spec.name, spec.description, spec.is_default)
                .await?;
            let names: Vec<String> = spec
                .grants
                .resolve(&self.catalog)
                .into_iter()
                .map(|def| def.name.clone())
                .collect();
            let ids = self.store.permission_ids_by_names(&names).await?;
            self.store.replace_role_permissions(role.id, &ids).await?;
            debug!(role = spec.name, permissions = ids.len(), "role seeded");
        }

        self.cache.invalidate();
        self.audit
            .record(
                AuditLogRecord::new(SYSTEM_ACTOR, actions::RBAC_SEEDED, "system")
                    .with_details(json!({ "permissions": self.catalog.len() })),
            )
            .await;
        info!(permissions = self.catalog.len(), "default roles seeded");
        Ok(())
    }

    /// Whether the principal holds the named permission.
    ///
    /// Fails closed: unknown principals, principals without roles, and
    /// store failures all yield false. Resolution is a bounded number of
    /// point queries (user lookup, roles-for-user, membership check), never
    /// a per-role fan-out.
    pub async fn user_has_permission(&self, principal: AccountId, permission: &str) -> bool {
        if !self.options.enabled {
            return self.options.legacy_admin_ids.contains(&principal);
        }
        if let Some(cached) = self.cache.get(principal, permission) {
            return cached;
        }
        match self.check_permission(principal, permission).await {
            Ok(allowed) => {
                self.cache.put(principal, permission, allowed);
                allowed
            }
            Err(err) => {
                warn!(
                    principal,
                    permission,
                    error = %err,
                    "permission check failed, denying"
                );
                false
            }
        }
    }

    async fn check_permission(&self, principal: AccountId, permission: &str) -> Result<bool> {
        let Some(user) = self.store.user_by_account(principal).await? else {
            return Ok(false);
        };
        let role_ids = self.store.role_ids_for_user(user.id).await?;
        if role_ids.is_empty() {
            return Ok(false);
        }
        let names = self.store.permission_names_for_roles(&role_ids).await?;
        Ok(names.contains(permission))
    }

    /// Names of the roles the principal holds.
    ///
    /// Fails open: an unknown principal, an empty role set, a store failure,
    /// or RBAC being disabled all yield the configured default role.
    pub async fn get_user_roles(&self, principal: AccountId) -> Vec<String> {
        if !self.options.enabled {
            return vec![self.options.default_role.clone()];
        }
        match self.lookup_roles(principal).await {
            Ok(roles) if !roles.is_empty() => roles,
            Ok(_) => vec![self.options.default_role.clone()],
            Err(err) => {
                warn!(principal, error = %err, "role lookup failed, using default role");
                vec![self.options.default_role.clone()]
            }
        }
    }

    async fn lookup_roles(&self, principal: AccountId) -> Result<Vec<String>> {
        let Some(user) = self.store.user_by_account(principal).await? else {
            return Ok(Vec::new());
        };
        Ok(self.store.role_names_for_user(user.id).await?)
    }

    /// Whether the principal explicitly holds the named role.
    pub async fn user_has_role(&self, principal: AccountId, role: &str) -> bool {
        if !self.options.enabled {
            return role == self.options.default_role;
        }
        match self.lookup_roles(principal).await {
            Ok(roles) => roles.iter().any(|held| held == role),
            Err(err) => {
                warn!(principal, role, error = %err, "role check failed");
                false
            }
        }
    }

    /// Whether the principal is an administrator (holds `super_admin` or
    /// `admin`; with RBAC disabled, membership in the legacy list).
    pub async fn is_admin(&self, principal: AccountId) -> bool {
        if !self.options.enabled {
            return self.options.legacy_admin_ids.contains(&principal);
        }
        match self.lookup_roles(principal).await {
            Ok(roles) => roles.iter().any(|role| role == SUPER_ADMIN || role == ADMIN),
            Err(err) => {
                warn!(principal, error = %err, "admin check failed, denying");
                false
            }
        }
    }

    /// Assign a role to a principal.
    ///
    /// Idempotent: an already-held role is success without a write. Returns
    /// false when the principal or role does not exist, or on store failure.
    pub async fn assign_role_to_user(&self, principal: AccountId, role_name: &str) -> bool {
        if !self.options.enabled {
            warn!(principal, role_name, "rbac disabled, refusing role assignment");
            return false;
        }
        match self.try_assign_role(principal, role_name).await {
            Ok(_) => true,
            Err(err) => {
                warn!(principal, role_name, error = %err, "role assignment failed");
                false
            }
        }
    }

    async fn try_assign_role(&self, principal: AccountId, role_name: &str) -> Result<bool> {
        let user = self
            .store
            .user_by_account(principal)
            .await?
            .ok_or(RbacError::PrincipalNotFound(principal))?;
        let role = self
            .store
            .role_by_name(role_name)
            .await?
            .ok_or_else(|| RbacError::RoleNotFound(role_name.to_string()))?;

        let inserted = self.store.assign_role(user.id, role.id).await?;
        if inserted {
            self.cache.invalidate();
            self.audit
                .record(
                    AuditLogRecord::new(SYSTEM_ACTOR, actions::ROLE_ASSIGNED, "role")
                        .with_user(user.id)
                        .with_resource_id(role.id)
                        .with_details(json!({ "role": role_name, "account_id": principal })),
                )
                .await;
        }
        Ok(inserted)
    }

    /// Remove a role from a principal.
    ///
    /// Idempotent: removing an edge that does not exist (including for an
    /// unknown principal or role) is a successful no-op. Returns false only
    /// on store failure.
    pub async fn remove_user_role(&self, principal: AccountId, role_name: &str) -> bool {
        if !self.options.enabled {
            warn!(principal, role_name, "rbac disabled, refusing role removal");
            return false;
        }
        match self.try_remove_role(principal, role_name).await {
            Ok(_) => true,
            Err(err) => {
                warn!(principal, role_name, error = %err, "role removal failed");
                false
            }
        }
    }

    async fn try_remove_role(&self, principal: AccountId, role_name: &str) -> Result<bool> {
        let Some(user) = self.store.user_by_account(principal).await? else {
            return Ok(false);
        };
        let Some(role) = self.store.role_by_name(role_name).await? else {
            return Ok(false);
        };

        let removed = self.store.remove_role(user.id, role.id).await?;
        if removed {
            self.cache.invalidate();
            self.audit
                .record(
                    AuditLogRecord::new(SYSTEM_ACTOR, actions::ROLE_REMOVED, "role")
                        .with_user(user.id)
                        .with_resource_id(role.id)
                        .with_details(json!({ "role": role_name, "account_id": principal })),
                )
                .await;
        }
        Ok(removed)
    }

    /// Converge the configured legacy-admin list into the graph: every
    /// listed identity ends up holding `super_admin`.
    ///
    /// Additive only, by design: identities that left the list keep their
    /// role, so a configuration slip cannot lock an operator out. Safe to
    /// call on every startup; reruns never create duplicate edges.
    pub async fn sync_legacy_admins(&self) -> Result<()> {
        if !self.options.enabled {
            debug!("rbac disabled, skipping legacy admin sync");
            return Ok(());
        }
        let role = self
            .store
            .role_by_name(SUPER_ADMIN)
            .await?
            .ok_or_else(|| RbacError::RoleNotFound(SUPER_ADMIN.to_string()))?;

        for account_id in &self.options.legacy_admin_ids {
            let (user, created) = self.store.ensure_user(NewUser::new(*account_id)).await?;
            if created {
                debug!(account_id, "created user row for legacy admin");
            }
            let inserted = self.store.assign_role(user.id, role.id).await?;
            if inserted {
                self.cache.invalidate();
                info!(account_id, "legacy admin granted super_admin");
                self.audit
                    .record(
                        AuditLogRecord::new(SYSTEM_ACTOR, actions::LEGACY_ADMIN_SYNCED, "user")
                            .with_user(user.id)
                            .with_details(json!({ "account_id": account_id })),
                    )
                    .await;
            }
        }
        Ok(())
    }

    /// Remove `super_admin` from every principal not on the legacy list.
    ///
    /// The revoke-capable counterpart of [`sync_legacy_admins`]. Never runs
    /// as part of startup; an operator invokes it deliberately. Returns the
    /// account ids that were revoked.
    ///
    /// [`sync_legacy_admins`]: RbacEngine::sync_legacy_admins
    pub async fn revoke_unlisted_admins(&self) -> Result<Vec<AccountId>> {
        let role = self
            .store
            .role_by_name(SUPER_ADMIN)
            .await?
            .ok_or_else(|| RbacError::RoleNotFound(SUPER_ADMIN.to_string()))?;

        let mut revoked = Vec::new();
        for user in self.store.users_with_role(role.id).await? {
            if self.options.legacy_admin_ids.contains(&user.account_id) {
                continue;
            }
            if self.store.remove_role(user.id, role.id).await? {
                self.cache.invalidate();
                info!(account_id = user.account_id, "super_admin revoked");
                self.audit
                    .record(
                        AuditLogRecord::new(SYSTEM_ACTOR, actions::ADMIN_REVOKED, "user")
                            .with_user(user.id)
                            .with_details(json!({ "account_id": user.account_id })),
                    )
                    .await;
                revoked.push(user.account_id);
            }
        }
        Ok(revoked)
    }

    /// Best-effort snapshot of the role graph. Never fails; unreachable
    /// stores yield a zeroed snapshot.
    pub async fn diagnostics(&self) -> RbacDiagnostics {
        let mut snapshot = RbacDiagnostics {
            enabled: self.options.enabled,
            ..Default::default()
        };

        match self.store.role_stats().await {
            Ok(stats) => {
                snapshot.role_count = stats.len() as u64;
                snapshot.roles = stats
                    .into_iter()
                    .map(|s| RoleDiagnostics {
                        name: s.role.name,
                        is_default: s.role.is_default,
                        permission_count: s.permission_count,
                        member_count: s.member_count,
                    })
                    .collect();
            }
            Err(err) => warn!(error = %err, "diagnostics: role stats unavailable"),
        }
        match self.store.all_permissions().await {
            Ok(permissions) => snapshot.permission_count = permissions.len() as u64,
            Err(err) => warn!(error = %err, "diagnostics: permissions unavailable"),
        }
        match self.store.user_count().await {
            Ok(count) => snapshot.user_count = count,
            Err(err) => warn!(error = %err, "diagnostics: user count unavailable"),
        }
        match self.store.edge_counts().await {
            Ok(counts) => {
                snapshot.user_role_edges = counts.user_roles;
                snapshot.role_permission_edges = counts.role_permissions;
            }
            Err(err) => warn!(error = %err, "diagnostics: edge counts unavailable"),
        }
        snapshot
    }
}
