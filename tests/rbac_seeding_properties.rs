//! Seeding and catalog-convergence properties of the RBAC engine

use std::sync::Arc;

use modbot_rbac::{
    catalog, PermissionCategory, PermissionDef, RbacEngine, RbacOptions, ADMIN, SUPER_ADMIN, USER,
};
use modbot_store::{AuthStore, MemoryAuthStore, NewUser};

fn engine(store: Arc<dyn AuthStore>) -> RbacEngine {
    RbacEngine::new(store, RbacOptions::default())
}

async fn permission_names_of(store: &Arc<dyn AuthStore>, role: &str) -> std::collections::HashSet<String> {
    let role = store.role_by_name(role).await.unwrap().unwrap();
    store.permission_names_for_roles(&[role.id]).await.unwrap()
}

#[tokio::test]
async fn super_admin_holds_every_catalog_permission() {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    engine(Arc::clone(&store)).seed_default_roles().await.unwrap();

    let names = permission_names_of(&store, SUPER_ADMIN).await;
    for def in catalog() {
        assert!(names.contains(&def.name), "super_admin missing {}", def.name);
    }
}

#[tokio::test]
async fn admin_holds_everything_outside_the_system_category() {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    engine(Arc::clone(&store)).seed_default_roles().await.unwrap();

    let names = permission_names_of(&store, ADMIN).await;
    for def in catalog() {
        if def.category == PermissionCategory::System {
            assert!(!names.contains(&def.name), "admin must not hold {}", def.name);
        } else {
            assert!(names.contains(&def.name), "admin missing {}", def.name);
        }
    }
}

#[tokio::test]
async fn user_role_is_default_and_holds_nothing() {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    engine(Arc::clone(&store)).seed_default_roles().await.unwrap();

    let role = store.role_by_name(USER).await.unwrap().unwrap();
    assert!(role.is_default);
    assert!(permission_names_of(&store, USER).await.is_empty());
}

#[tokio::test]
async fn reseeding_with_modified_catalog_converges_edges() {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());

    let original = vec![
        PermissionDef::new("user.view", "View users", PermissionCategory::UserManagement),
        PermissionDef::new("user.purge", "Purge users", PermissionCategory::UserManagement),
    ];
    RbacEngine::with_catalog(Arc::clone(&store), RbacOptions::default(), original)
        .seed_default_roles()
        .await
        .unwrap();

    // user.purge was renamed to user.delete in a later release
    let revised = vec![
        PermissionDef::new("user.view", "View users", PermissionCategory::UserManagement),
        PermissionDef::new("user.delete", "Delete users", PermissionCategory::UserManagement),
    ];
    RbacEngine::with_catalog(Arc::clone(&store), RbacOptions::default(), revised)
        .seed_default_roles()
        .await
        .unwrap();

    for role in [SUPER_ADMIN, ADMIN] {
        let names = permission_names_of(&store, role).await;
        assert!(names.contains("user.view"));
        assert!(names.contains("user.delete"));
        assert!(
            !names.contains("user.purge"),
            "{role} kept a stale edge for the renamed permission"
        );
    }
}

#[tokio::test]
async fn scenario_three_permission_catalog() {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    let catalog = vec![
        PermissionDef::new("user.view", "View users", PermissionCategory::UserManagement),
        PermissionDef::new("user.delete", "Delete users", PermissionCategory::UserManagement),
        PermissionDef::new(
            "system.settings.edit",
            "Edit settings",
            PermissionCategory::System,
        ),
    ];
    let engine = RbacEngine::with_catalog(Arc::clone(&store), RbacOptions::default(), catalog);
    engine.seed_default_roles().await.unwrap();

    store.ensure_user(NewUser::new(42)).await.unwrap();
    assert!(engine.assign_role_to_user(42, ADMIN).await);

    assert!(engine.user_has_permission(42, "user.delete").await);
    assert!(!engine.user_has_permission(42, "system.settings.edit").await);
}

#[tokio::test]
async fn seeding_is_idempotent_across_engines() {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());

    engine(Arc::clone(&store)).seed_default_roles().await.unwrap();
    let roles_before = store.all_roles().await.unwrap().len();
    let edges_before = store.edge_counts().await.unwrap();

    // a second process start over the same store
    engine(Arc::clone(&store)).seed_default_roles().await.unwrap();
    assert_eq!(store.all_roles().await.unwrap().len(), roles_before);
    assert_eq!(store.edge_counts().await.unwrap(), edges_before);
}
