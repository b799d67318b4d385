//! Dependency injection support for modbot-extensions

use std::sync::Arc;

use modbot_common::di::{ServiceEntry, ServiceFactory};

use crate::registry::ExtensionRegistry;

inventory::submit! {
    ServiceFactory::new("extensions", create_extension_services)
}

fn create_extension_services() -> Vec<ServiceEntry> {
    vec![ServiceEntry::new::<ExtensionRegistry>(Arc::new(
        ExtensionRegistry::from_inventory(),
    ))]
}
