//! Dependency injection support for modbot-store

use std::sync::Arc;

use modbot_common::di::{ServiceEntry, ServiceFactory};

use crate::MemoryAuthStore;

inventory::submit! {
    ServiceFactory::with_priority("store", create_store_services, 10)
}

fn create_store_services() -> Vec<ServiceEntry> {
    vec![ServiceEntry::new::<MemoryAuthStore>(Arc::new(
        MemoryAuthStore::new(),
    ))]
}

#[cfg(test)]
mod tests {
    use modbot_common::di::list_factories;

    #[test]
    fn test_store_factory_registered() {
        let factories = list_factories();
        assert!(factories.contains(&"store"), "factory should be registered");
    }
}
