//! The extension capability interface
//!
//! Required methods are what the lifecycle manager cannot work without;
//! everything else has a default returning a sensible zero value, so a
//! minimal extension cannot crash the host by leaving something out.

use std::sync::Arc;

use modbot_config::ConfigManager;
use modbot_store::AuthStore;

use crate::routing::{MenuContributions, RoutingSurface};

/// Shared dependencies handed to every extension factory.
#[derive(Clone)]
pub struct ExtensionContext {
    pub config: Arc<ConfigManager>,
    pub store: Arc<dyn AuthStore>,
}

impl ExtensionContext {
    pub fn new(config: Arc<ConfigManager>, store: Arc<dyn AuthStore>) -> Self {
        Self { config, store }
    }
}

/// A self-contained unit contributing request handlers and menu surface,
/// loaded and toggled independently of the core.
pub trait Extension: Send + Sync {
    /// Stable identifier, also the key of the extension's config section.
    fn id(&self) -> &str;

    /// The handler set this extension contributes once enabled.
    fn routing_surface(&self) -> RoutingSurface;

    /// Human-readable name for operator views.
    fn display_name(&self) -> String {
        self.id().to_uppercase()
    }

    /// Short description for operator views.
    fn description(&self) -> String {
        String::new()
    }

    fn version(&self) -> String {
        "1.0.0".to_string()
    }

    /// Menu buttons this extension contributes.
    fn menu(&self) -> MenuContributions {
        MenuContributions::default()
    }

    /// The extension's effective configuration, for operator views.
    fn config_value(&self) -> Option<serde_json::Value> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Extension for Bare {
        fn id(&self) -> &str {
            "bare"
        }

        fn routing_surface(&self) -> RoutingSurface {
            RoutingSurface::new()
        }
    }

    #[test]
    fn test_optional_methods_have_defaults() {
        let ext = Bare;
        assert_eq!(ext.display_name(), "BARE");
        assert_eq!(ext.description(), "");
        assert_eq!(ext.version(), "1.0.0");
        assert_eq!(ext.menu(), MenuContributions::default());
        assert!(ext.config_value().is_none());
        assert!(ext.routing_surface().is_empty());
    }
}
