//! Settings structures deserialized from file and environment

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// Core host settings.
///
/// Every field has a default so a missing config file yields a usable
/// (if empty) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Statically configured administrator account ids (the legacy admin
    /// list reconciled into the role graph at startup). Accepts a TOML list
    /// or a comma-separated string such as `"123456,789012"` so the value
    /// can also arrive via `MODBOT_ADMIN_IDS`.
    #[serde(deserialize_with = "deserialize_id_list")]
    pub admin_ids: Vec<i64>,

    /// Role-based access control switches.
    pub rbac: RbacSettings,

    /// Extension discovery and presentation.
    pub extensions: ExtensionSettings,

    /// Durable storage location.
    pub storage: StorageSettings,

    /// Operator contact handle shown in user-facing fallbacks.
    pub support: String,

    /// Per-extension config sections, keyed by extension id
    /// (`[extension.<id>]` tables). Opaque to the core.
    pub extension: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            rbac: RbacSettings::default(),
            extensions: ExtensionSettings::default(),
            storage: StorageSettings::default(),
            support: "support".to_string(),
            extension: HashMap::new(),
        }
    }
}

/// RBAC engine switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacSettings {
    /// Deployment-level kill switch. When false the engine bypasses the
    /// role graph entirely.
    pub enabled: bool,
    /// Role name reported for principals with no explicit role.
    pub default_role: String,
}

impl Default for RbacSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_role: "user".to_string(),
        }
    }
}

/// How extension menu contributions surface in the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Extensions merge their buttons into the main menu.
    Integrated,
    /// Each extension gets a single entry button.
    Standalone,
}

/// Extension discovery and presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionSettings {
    /// Root directory scanned for extension manifests.
    pub dir: PathBuf,
    /// Menu presentation mode.
    pub display_mode: DisplayMode,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("extensions"),
            display_mode: DisplayMode::Integrated,
        }
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory holding the store snapshot and extension state file.
    /// None means purely in-memory operation.
    pub path: Option<PathBuf>,
}

fn deserialize_id_list<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<i64>),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::List(ids) => Ok(ids),
        Raw::Text(text) => text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<i64>().map_err(serde::de::Error::custom))
            .collect(),
    }
}
