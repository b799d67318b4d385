//! Configuration for the modbot host
//!
//! Loads core settings from a TOML file plus `MODBOT_*` environment
//! overrides, and hands extensions their own `[extension.<id>]` config
//! sections without exposing anyone else's.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{DisplayMode, ExtensionSettings, RbacSettings, Settings, StorageSettings};
