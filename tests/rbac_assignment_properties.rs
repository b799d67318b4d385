//! Idempotency and convergence properties of role assignment and
//! legacy-admin reconciliation

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use modbot_rbac::{RbacEngine, RbacOptions, ADMIN, SUPER_ADMIN, USER};
use modbot_store::{AuthStore, MemoryAuthStore, NewUser};

async fn seeded_engine(options: RbacOptions) -> RbacEngine {
    let store: Arc<dyn AuthStore> = Arc::new(MemoryAuthStore::new());
    let engine = RbacEngine::new(store, options);
    engine.seed_default_roles().await.unwrap();
    engine
}

#[tokio::test]
async fn assigning_twice_equals_assigning_once() {
    let engine = seeded_engine(RbacOptions::default()).await;
    engine.store().ensure_user(NewUser::new(42)).await.unwrap();

    assert!(engine.assign_role_to_user(42, ADMIN).await);
    let once = engine.get_user_roles(42).await;

    assert!(engine.assign_role_to_user(42, ADMIN).await);
    assert_eq!(engine.get_user_roles(42).await, once);
    assert_eq!(engine.store().edge_counts().await.unwrap().user_roles, 1);
}

#[tokio::test]
async fn removing_a_never_held_role_changes_nothing() {
    let engine = seeded_engine(RbacOptions::default()).await;
    engine.store().ensure_user(NewUser::new(42)).await.unwrap();
    engine.assign_role_to_user(42, USER).await;

    let before = engine.get_user_roles(42).await;
    assert!(engine.remove_user_role(42, ADMIN).await);
    assert_eq!(engine.get_user_roles(42).await, before);
}

#[tokio::test]
async fn unknown_principal_never_has_permission_and_never_panics() {
    let engine = seeded_engine(RbacOptions::default()).await;
    for permission in ["user.view", "system.settings.edit", "made.up.permission", ""] {
        assert!(!engine.user_has_permission(987654321, permission).await);
    }
}

#[tokio::test]
async fn legacy_admin_sync_converges_and_stays_converged() {
    let engine = seeded_engine(RbacOptions {
        legacy_admin_ids: vec![7],
        ..Default::default()
    })
    .await;

    // principal 7 is unknown before the sync
    assert!(engine.store().user_by_account(7).await.unwrap().is_none());

    engine.sync_legacy_admins().await.unwrap();
    assert_eq!(engine.get_user_roles(7).await, vec![SUPER_ADMIN.to_string()]);

    let edges = engine.store().edge_counts().await.unwrap();
    engine.sync_legacy_admins().await.unwrap();
    assert_eq!(engine.store().edge_counts().await.unwrap(), edges);
}

#[tokio::test]
async fn rbac_disabled_reports_configured_default_role() {
    let engine = seeded_engine(RbacOptions {
        enabled: false,
        default_role: "member".to_string(),
        legacy_admin_ids: vec![7],
    })
    .await;

    for principal in [1, 7, 42, -5] {
        assert_eq!(
            engine.get_user_roles(principal).await,
            vec!["member".to_string()]
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any interleaving of assigns and removes ends in exactly the role set
    /// computed by replaying the operations over a plain set.
    #[test]
    fn assignment_sequences_behave_like_set_operations(
        ops in proptest::collection::vec((0usize..3, prop_oneof![Just(true), Just(false)]), 0..24)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let engine = seeded_engine(RbacOptions::default()).await;
            engine.store().ensure_user(NewUser::new(42)).await.unwrap();

            let roles = [SUPER_ADMIN, ADMIN, USER];
            let mut model: HashSet<&str> = HashSet::new();

            for (index, assign) in ops {
                let role = roles[index];
                if assign {
                    prop_assert!(engine.assign_role_to_user(42, role).await);
                    model.insert(role);
                } else {
                    prop_assert!(engine.remove_user_role(42, role).await);
                    model.remove(role);
                }
            }

            let held: HashSet<String> = engine.get_user_roles(42).await.into_iter().collect();
            if model.is_empty() {
                // display fallback: no explicit roles reports the default
                prop_assert_eq!(held, HashSet::from([USER.to_string()]));
            } else {
                let expected: HashSet<String> =
                    model.iter().map(|r| r.to_string()).collect();
                prop_assert_eq!(held, expected);
            }
            Ok(())
        })?;
    }

    /// Syncing any legacy-admin list any number of times yields one
    /// super_admin edge per listed identity.
    #[test]
    fn legacy_sync_is_idempotent_for_any_list(
        ids in proptest::collection::hash_set(1i64..1000, 0..8),
        repeats in 1usize..4
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let engine = seeded_engine(RbacOptions {
                legacy_admin_ids: ids.iter().copied().collect(),
                ..Default::default()
            })
            .await;

            for _ in 0..repeats {
                engine.sync_legacy_admins().await.unwrap();
            }

            let edges = engine.store().edge_counts().await.unwrap();
            prop_assert_eq!(edges.user_roles, ids.len() as u64);
            for id in &ids {
                prop_assert!(engine.user_has_role(*id, SUPER_ADMIN).await);
            }
            Ok(())
        })?;
    }
}
