//! Canonical role definitions
//!
//! Role definitions are declarative: seeding replaces a role's permission
//! edges with the set computed here, so reseeding always converges to the
//! compiled-in catalog even after out-of-band edits.

use crate::catalog::{PermissionCategory, PermissionDef};

/// Role holding the full catalog.
pub const SUPER_ADMIN: &str = "super_admin";
/// Role holding everything except the system category.
pub const ADMIN: &str = "admin";
/// Default role; holds no permissions.
pub const USER: &str = "user";

/// Which slice of the catalog a role is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grants {
    All,
    AllExcept(PermissionCategory),
    None,
}

impl Grants {
    /// Resolve the grant against a catalog.
    pub fn resolve<'a>(&self, catalog: &'a [PermissionDef]) -> Vec<&'a PermissionDef> {
        match self {
            Grants::All => catalog.iter().collect(),
            Grants::AllExcept(category) => {
                catalog.iter().filter(|d| d.category != *category).collect()
            }
            Grants::None => Vec::new(),
        }
    }
}

/// A canonical role and its grant.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub is_default: bool,
    pub grants: Grants,
}

/// The three canonical roles seeded on every startup.
pub fn canonical_roles() -> Vec<RoleSpec> {
    vec![
        RoleSpec {
            name: SUPER_ADMIN,
            description: "Full access including system settings",
            is_default: false,
            grants: Grants::All,
        },
        RoleSpec {
            name: ADMIN,
            description: "Administrative access without system settings",
            is_default: false,
            grants: Grants::AllExcept(PermissionCategory::System),
        },
        RoleSpec {
            name: USER,
            description: "Regular user",
            is_default: true,
            grants: Grants::None,
        },
    ]
}
