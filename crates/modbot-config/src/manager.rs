//! Configuration manager implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    types::Settings,
};

/// Owns the loaded [`Settings`] and hands extensions their config sections.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    settings: Settings,
}

impl ConfigManager {
    /// Wrap already-built settings (used by tests and embedding hosts).
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Load settings from `path` (or the default locations) plus
    /// `MODBOT_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = Settings::load(path)?;
        Ok(Self { settings })
    }

    /// The core settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Deserialize an extension's `[extension.<id>]` section into its own
    /// config type.
    pub fn extension_config<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        let value = self
            .settings
            .extension
            .get(id)
            .ok_or_else(|| ConfigError::ExtensionSectionMissing(id.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// The raw config section for an extension, if one exists.
    pub fn extension_config_value(&self, id: &str) -> Option<&serde_json::Value> {
        self.settings.extension.get(id)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Settings {
    /// Load settings from a TOML file and the environment.
    ///
    /// Search order when no explicit path is given: `./modbot.toml`, then
    /// `~/.modbot/config.toml`. A missing file is not an error; environment
    /// variables prefixed with `MODBOT_` (nested keys separated by `__`,
    /// e.g. `MODBOT_RBAC__ENABLED`) override file values either way.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(explicit) => {
                builder = builder.add_source(File::from(explicit.to_path_buf()));
            }
            None => {
                for candidate in Self::default_paths() {
                    builder = builder.add_source(File::from(candidate).required(false));
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("MODBOT")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        debug!(
            admin_ids = settings.admin_ids.len(),
            rbac_enabled = settings.rbac.enabled,
            "settings loaded"
        );
        Ok(settings)
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("modbot.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".modbot").join("config.toml"));
        }
        paths
    }
}
