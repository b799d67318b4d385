//! Extension registry and discovery
//!
//! Two registration tiers. The push model is a compile-time list: extension
//! crates submit a [`StaticExtension`] via `inventory::submit!` and the
//! registry collects them at startup. The pull model reads `extension.toml`
//! manifests from the extensions directory and attaches their metadata and
//! enabled flags to registered factories; it never introspects symbols, and
//! a manifest without a compiled-in factory is reported, not loaded.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ExtensionError, Result};
use crate::traits::{Extension, ExtensionContext};

/// Constructs an extension from the shared dependencies.
pub type ExtensionFactory = fn(&ExtensionContext) -> Result<Box<dyn Extension>>;

/// Compile-time registration entry.
pub struct StaticExtension {
    pub id: &'static str,
    pub factory: ExtensionFactory,
}

impl StaticExtension {
    pub const fn new(id: &'static str, factory: ExtensionFactory) -> Self {
        Self { id, factory }
    }
}

inventory::collect!(StaticExtension);

/// Metadata file an extension ships in its directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Whether the extension starts enabled; absent means enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// A registered factory plus any manifest found for it.
pub struct RegisteredExtension {
    pub id: String,
    pub factory: ExtensionFactory,
    pub manifest: Option<ExtensionManifest>,
}

impl RegisteredExtension {
    /// The extension's own enabled flag; enabled when no manifest says
    /// otherwise.
    pub fn enabled_by_default(&self) -> bool {
        self.manifest.as_ref().map(|m| m.enabled).unwrap_or(true)
    }
}

/// What a discovery pass found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    /// Manifests attached to a registered factory.
    pub manifests_applied: usize,
    /// Manifests naming an extension no factory was compiled in for.
    pub unmatched: usize,
}

/// Process-wide catalog mapping extension ids to factories.
#[derive(Default)]
pub struct ExtensionRegistry {
    entries: HashMap<String, RegisteredExtension>,
}

impl ExtensionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `StaticExtension` submitted across linked crates.
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for entry in inventory::iter::<StaticExtension>() {
            registry.register(entry.id, entry.factory);
        }
        debug!(count = registry.len(), "registry built from inventory");
        registry
    }

    /// Register a factory. Duplicate ids warn and the last writer wins.
    pub fn register(&mut self, id: impl Into<String>, factory: ExtensionFactory) {
        let id = id.into();
        if self.entries.contains_key(&id) {
            warn!(%id, "duplicate extension registration, replacing");
        }
        self.entries.insert(
            id.clone(),
            RegisteredExtension {
                id,
                factory,
                manifest: None,
            },
        );
    }

    /// Scan the extensions root for manifests and attach them to registered
    /// factories.
    ///
    /// A candidate is any subdirectory whose name does not start with `_`
    /// or `.` and which contains `extension.toml`. A missing or unreadable
    /// root is logged once and leaves the registry untouched; the host
    /// continues with whatever was registered at compile time.
    pub fn discover(&mut self, dir: &Path) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    dir = %dir.display(),
                    error = %err,
                    "extensions directory unreadable, continuing without manifests"
                );
                return report;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('_') || name.starts_with('.') {
                continue;
            }

            let manifest_path = path.join("extension.toml");
            if !manifest_path.exists() {
                debug!(dir = %path.display(), "no manifest, skipping");
                continue;
            }

            let manifest = match Self::read_manifest(&manifest_path) {
                Ok(manifest) => manifest,
                Err(err) => {
                    warn!(path = %manifest_path.display(), error = %err, "bad manifest");
                    continue;
                }
            };

            match self.entries.get_mut(&manifest.id) {
                Some(registered) => {
                    debug!(id = %manifest.id, enabled = manifest.enabled, "manifest applied");
                    registered.manifest = Some(manifest);
                    report.manifests_applied += 1;
                }
                None => {
                    warn!(
                        id = %manifest.id,
                        "manifest names an extension with no compiled-in factory"
                    );
                    report.unmatched += 1;
                }
            }
        }
        report
    }

    fn read_manifest(path: &Path) -> Result<ExtensionManifest> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|err| ExtensionError::Manifest {
            path: path.display().to_string(),
            reason: err.to_string(),
        })
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredExtension> {
        self.entries.get(id)
    }

    /// Registered ids, sorted for deterministic iteration.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
