//! The compiled-in permission catalog
//!
//! Pure data. No permission is created or deleted at runtime; seeding
//! pushes this set into the store and role definitions reference it by
//! name.

use serde::{Deserialize, Serialize};

/// Grouping of permissions by the surface they protect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    UserManagement,
    ExtensionManagement,
    System,
    AdminSurface,
}

impl PermissionCategory {
    /// Stable name stored in the permissions table.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionCategory::UserManagement => "user_management",
            PermissionCategory::ExtensionManagement => "extension_management",
            PermissionCategory::System => "system",
            PermissionCategory::AdminSurface => "admin_surface",
        }
    }
}

impl std::fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable permission definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionDef {
    /// Unique dotted name, e.g. `user.delete`.
    pub name: String,
    pub description: String,
    pub category: PermissionCategory,
}

impl PermissionDef {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: PermissionCategory,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
        }
    }
}

/// The full compiled-in catalog.
pub fn catalog() -> Vec<PermissionDef> {
    use PermissionCategory::*;

    vec![
        // user management
        PermissionDef::new("user.view", "View users", UserManagement),
        PermissionDef::new("user.edit", "Edit users", UserManagement),
        PermissionDef::new("user.delete", "Delete users", UserManagement),
        PermissionDef::new("user.role.assign", "Assign roles to users", UserManagement),
        // extension management
        PermissionDef::new("extension.view", "View extensions", ExtensionManagement),
        PermissionDef::new("extension.install", "Install extensions", ExtensionManagement),
        PermissionDef::new(
            "extension.configure",
            "Configure extensions",
            ExtensionManagement,
        ),
        PermissionDef::new(
            "extension.uninstall",
            "Uninstall extensions",
            ExtensionManagement,
        ),
        // system
        PermissionDef::new("system.stats.view", "View system statistics", System),
        PermissionDef::new("system.logs.view", "View system logs", System),
        PermissionDef::new("system.settings.edit", "Edit system settings", System),
        // admin surface
        PermissionDef::new("admin.panel.access", "Access the admin panel", AdminSurface),
        PermissionDef::new("admin.panel.dashboard", "View the dashboard", AdminSurface),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_unique() {
        let defs = catalog();
        let names: HashSet<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
    }

    #[test]
    fn test_every_category_is_present() {
        let defs = catalog();
        for category in [
            PermissionCategory::UserManagement,
            PermissionCategory::ExtensionManagement,
            PermissionCategory::System,
            PermissionCategory::AdminSurface,
        ] {
            assert!(defs.iter().any(|d| d.category == category));
        }
    }

    #[test]
    fn test_category_names() {
        assert_eq!(PermissionCategory::System.as_str(), "system");
        assert_eq!(
            PermissionCategory::ExtensionManagement.to_string(),
            "extension_management"
        );
    }
}
