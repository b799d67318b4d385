//! Extension lifecycle manager
//!
//! Bridges static registration and the live routing surface. Instantiation
//! failures are isolated per extension: one bad factory is logged and
//! omitted, the rest load normally. Enabled/disabled toggles are persisted
//! best-effort to a JSON state file and reapplied on the next load.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use modbot_config::DisplayMode;

use crate::registry::ExtensionRegistry;
use crate::routing::{MenuButton, RequestHandler, RoutingSurface};
use crate::traits::{Extension, ExtensionContext};

const STATE_FILE: &str = "extension_states.json";

/// Lifecycle state of one extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionState {
    /// Known to the registry, not instantiated.
    Registered,
    /// Instantiated, routing surface live.
    Enabled,
    /// Inert; its routes are refused at the dispatch boundary.
    Disabled,
}

/// Best-effort metadata about one extension for operator views.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionInfo {
    pub name: String,
    pub state: Option<ExtensionState>,
    pub enabled: bool,
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub handler_count: usize,
    pub has_menu: bool,
}

/// Aggregate extension statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub extensions: Vec<ExtensionInfo>,
}

/// A route resolved to its owning extension, cloned out of the manager's
/// lock so the dispatcher can await the handler freely.
#[derive(Clone)]
pub struct ResolvedRoute {
    pub extension_id: String,
    pub required_permission: Option<String>,
    pub handler: Arc<dyn RequestHandler>,
}

struct LoadedExtension {
    instance: Arc<dyn Extension>,
    surface: RoutingSurface,
}

#[derive(Default)]
struct ManagerState {
    loaded: HashMap<String, LoadedExtension>,
    states: HashMap<String, ExtensionState>,
}

/// Owns the set of installed extensions and their runtime on/off state.
pub struct ExtensionManager {
    registry: ExtensionRegistry,
    context: ExtensionContext,
    display_mode: DisplayMode,
    state_path: Option<PathBuf>,
    inner: RwLock<ManagerState>,
}

impl ExtensionManager {
    /// Create a manager over a registry. Display mode and the state-file
    /// location come from the shared configuration.
    pub fn new(registry: ExtensionRegistry, context: ExtensionContext) -> Self {
        let settings = context.config.settings();
        let display_mode = settings.extensions.display_mode;
        let state_path = settings
            .storage
            .path
            .as_ref()
            .map(|dir| dir.join(STATE_FILE));

        let mut states = HashMap::new();
        for id in registry.ids() {
            states.insert(id, ExtensionState::Registered);
        }

        Self {
            registry,
            context,
            display_mode,
            state_path,
            inner: RwLock::new(ManagerState {
                loaded: HashMap::new(),
                states,
            }),
        }
    }

    /// Instantiate every registered extension whose enabled flag allows it.
    ///
    /// Guarantees: every key in the result is Enabled; a factory failure is
    /// logged and that extension omitted; never panics or returns an error.
    /// Persisted toggles take precedence over manifest defaults.
    pub fn load_all(&self) -> HashMap<String, Arc<dyn Extension>> {
        let persisted = self.load_persisted_states();
        let mut inner = self.inner.write();
        inner.loaded.clear();

        let mut result: HashMap<String, Arc<dyn Extension>> = HashMap::new();
        for id in self.registry.ids() {
            let entry = match self.registry.get(&id) {
                Some(entry) => entry,
                None => continue,
            };
            inner.states.insert(id.clone(), ExtensionState::Registered);

            let enabled = persisted
                .get(&id)
                .copied()
                .unwrap_or_else(|| entry.enabled_by_default());
            if !enabled {
                info!(%id, "extension disabled, skipping construction");
                inner.states.insert(id.clone(), ExtensionState::Disabled);
                continue;
            }

            match (entry.factory)(&self.context) {
                Ok(instance) => {
                    let instance: Arc<dyn Extension> = Arc::from(instance);
                    let surface = instance.routing_surface();
                    info!(
                        %id,
                        handlers = surface.handler_count(),
                        "extension loaded and enabled"
                    );
                    inner.loaded.insert(
                        id.clone(),
                        LoadedExtension {
                            instance: Arc::clone(&instance),
                            surface,
                        },
                    );
                    inner.states.insert(id.clone(), ExtensionState::Enabled);
                    result.insert(id, instance);
                }
                Err(err) => {
                    error!(%id, error = %err, "failed to load extension");
                }
            }
        }

        info!(
            loaded = result.len(),
            registered = self.registry.len(),
            "extension loading finished"
        );
        result
    }

    /// Enable an extension, instantiating it if it never loaded.
    pub fn enable(&self, id: &str) -> bool {
        let Some(entry) = self.registry.get(id) else {
            warn!(id, "cannot enable unknown extension");
            return false;
        };

        let mut inner = self.inner.write();
        if inner.states.get(id) == Some(&ExtensionState::Enabled) {
            debug!(id, "extension already enabled");
            return true;
        }

        if !inner.loaded.contains_key(id) {
            match (entry.factory)(&self.context) {
                Ok(instance) => {
                    let instance: Arc<dyn Extension> = Arc::from(instance);
                    let surface = instance.routing_surface();
                    inner
                        .loaded
                        .insert(id.to_string(), LoadedExtension { instance, surface });
                }
                Err(err) => {
                    error!(id, error = %err, "failed to construct extension on enable");
                    return false;
                }
            }
        }

        inner.states.insert(id.to_string(), ExtensionState::Enabled);
        info!(id, "extension enabled");
        self.persist_states(&inner.states);
        true
    }

    /// Disable an extension. The instance and its surface are kept but
    /// marked inert; the dispatcher refuses its routes from now on.
    pub fn disable(&self, id: &str) -> bool {
        if self.registry.get(id).is_none() {
            warn!(id, "cannot disable unknown extension");
            return false;
        }

        let mut inner = self.inner.write();
        if inner.states.get(id) == Some(&ExtensionState::Disabled) {
            debug!(id, "extension already disabled");
            return true;
        }
        inner.states.insert(id.to_string(), ExtensionState::Disabled);
        info!(id, "extension disabled");
        self.persist_states(&inner.states);
        true
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.inner.read().states.get(id) == Some(&ExtensionState::Enabled)
    }

    /// Lifecycle state, None for an id the registry has never seen.
    pub fn state(&self, id: &str) -> Option<ExtensionState> {
        self.inner.read().states.get(id).copied()
    }

    /// Ids of enabled extensions, sorted.
    pub fn enabled_ids(&self) -> Vec<String> {
        self.ids_in_state(ExtensionState::Enabled)
    }

    /// Ids of disabled extensions, sorted.
    pub fn disabled_ids(&self) -> Vec<String> {
        self.ids_in_state(ExtensionState::Disabled)
    }

    fn ids_in_state(&self, wanted: ExtensionState) -> Vec<String> {
        let inner = self.inner.read();
        let mut ids: Vec<String> = inner
            .states
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Best-effort metadata for one extension. Always returns a record:
    /// unknown ids and unloaded extensions degrade to a minimal one.
    pub fn describe(&self, id: &str) -> ExtensionInfo {
        let inner = self.inner.read();
        let state = inner.states.get(id).copied();
        let enabled = state == Some(ExtensionState::Enabled);

        if let Some(loaded) = inner.loaded.get(id) {
            let menu = loaded.instance.menu();
            return ExtensionInfo {
                name: id.to_string(),
                state,
                enabled,
                display_name: loaded.instance.display_name(),
                description: loaded.instance.description(),
                version: loaded.instance.version(),
                handler_count: loaded.surface.handler_count(),
                has_menu: !menu.integrated.is_empty() || menu.entry.is_some(),
            };
        }

        let manifest = self.registry.get(id).and_then(|e| e.manifest.as_ref());
        ExtensionInfo {
            name: id.to_string(),
            state,
            enabled,
            display_name: manifest
                .and_then(|m| m.display_name.clone())
                .unwrap_or_else(|| id.to_uppercase()),
            description: manifest
                .and_then(|m| m.description.clone())
                .unwrap_or_default(),
            version: manifest
                .and_then(|m| m.version.clone())
                .unwrap_or_else(|| "1.0.0".to_string()),
            handler_count: 0,
            has_menu: false,
        }
    }

    /// Aggregate statistics for operator views.
    pub fn stats(&self) -> ExtensionStats {
        let extensions: Vec<ExtensionInfo> = self
            .registry
            .ids()
            .iter()
            .map(|id| self.describe(id))
            .collect();
        ExtensionStats {
            total: extensions.len(),
            enabled: extensions.iter().filter(|e| e.enabled).count(),
            disabled: extensions
                .iter()
                .filter(|e| e.state == Some(ExtensionState::Disabled))
                .count(),
            extensions,
        }
    }

    /// Menu buttons contributed by enabled extensions, honoring the
    /// configured display mode.
    pub fn menu_contributions(&self) -> Vec<MenuButton> {
        let inner = self.inner.read();
        let mut ids: Vec<&String> = inner.loaded.keys().collect();
        ids.sort();

        let mut buttons = Vec::new();
        for id in ids {
            if inner.states.get(id.as_str()) != Some(&ExtensionState::Enabled) {
                continue;
            }
            let menu = inner.loaded[id.as_str()].instance.menu();
            match self.display_mode {
                DisplayMode::Integrated => buttons.extend(menu.integrated),
                DisplayMode::Standalone => {
                    if let Some(entry) = menu.entry {
                        buttons.push(entry);
                    }
                }
            }
        }
        buttons
    }

    /// Resolve a route key against every loaded surface, enabled or not;
    /// the dispatcher decides what a hit on a disabled extension means.
    pub fn find_route(&self, route: &str) -> Option<ResolvedRoute> {
        let inner = self.inner.read();
        let mut ids: Vec<&String> = inner.loaded.keys().collect();
        ids.sort();

        for id in ids {
            if let Some(found) = inner.loaded[id.as_str()].surface.find(route) {
                return Some(ResolvedRoute {
                    extension_id: id.clone(),
                    required_permission: found.required_permission.clone(),
                    handler: Arc::clone(&found.handler),
                });
            }
        }
        None
    }

    fn load_persisted_states(&self) -> HashMap<String, bool> {
        let Some(path) = &self.state_path else {
            return HashMap::new();
        };
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(states) => states,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "bad state file, ignoring");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    fn persist_states(&self, states: &HashMap<String, ExtensionState>) {
        let Some(path) = &self.state_path else {
            return;
        };
        let flags: HashMap<&str, bool> = states
            .iter()
            .filter_map(|(id, state)| match state {
                ExtensionState::Enabled => Some((id.as_str(), true)),
                ExtensionState::Disabled => Some((id.as_str(), false)),
                ExtensionState::Registered => None,
            })
            .collect();

        let content = match serde_json::to_string_pretty(&flags) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to serialize extension states");
                return;
            }
        };
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
        })();
        if let Err(err) = result {
            warn!(path = %path.display(), error = %err, "failed to persist extension states");
        }
    }
}
