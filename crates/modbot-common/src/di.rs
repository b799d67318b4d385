//! Service registration for the composition root
//!
//! Crates submit a [`ServiceFactory`] via `inventory::submit!`; the host
//! collects every entry at startup and wires the resulting services
//! explicitly instead of reaching for process-wide singletons. Defined here
//! rather than in a dedicated DI crate so feature crates can register
//! services without circular dependencies.

use std::any::{Any, TypeId};
use std::sync::Arc;
use tracing::debug;

/// A type-erased service instance keyed by its concrete type.
pub struct ServiceEntry {
    /// Registration key.
    pub type_id: TypeId,
    /// Human-readable type name for diagnostics.
    pub type_name: &'static str,
    /// The service instance.
    pub instance: Arc<dyn Any + Send + Sync>,
}

impl ServiceEntry {
    /// Create an entry for a concrete service type.
    pub fn new<T: Send + Sync + 'static>(instance: Arc<T>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            instance: instance as Arc<dyn Any + Send + Sync>,
        }
    }

    /// Downcast the entry back to its concrete type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// A factory contributed by one crate, collected at link time.
pub struct ServiceFactory {
    /// Name of the service group (e.g. "store", "extensions").
    pub name: &'static str,
    /// Creates the group's services.
    pub factory_fn: fn() -> Vec<ServiceEntry>,
    /// Registration order, lower runs earlier.
    pub priority: u32,
}

impl ServiceFactory {
    /// Create a factory with the default priority.
    pub const fn new(name: &'static str, factory_fn: fn() -> Vec<ServiceEntry>) -> Self {
        Self {
            name,
            factory_fn,
            priority: 100,
        }
    }

    /// Create a factory with an explicit priority.
    pub const fn with_priority(
        name: &'static str,
        factory_fn: fn() -> Vec<ServiceEntry>,
        priority: u32,
    ) -> Self {
        Self {
            name,
            factory_fn,
            priority,
        }
    }
}

inventory::collect!(ServiceFactory);

/// Run every discovered factory in priority order and collect its services.
pub fn collect_services() -> Vec<ServiceEntry> {
    let mut factories: Vec<&ServiceFactory> = inventory::iter::<ServiceFactory>().collect();
    factories.sort_by_key(|f| f.priority);

    let mut services = Vec::new();
    for factory in factories {
        let entries = (factory.factory_fn)();
        debug!(group = factory.name, count = entries.len(), "collected services");
        services.extend(entries);
    }
    services
}

/// Number of factories discovered across all linked crates.
pub fn discovered_factory_count() -> usize {
    inventory::iter::<ServiceFactory>().count()
}

/// Names of every discovered factory.
pub fn list_factories() -> Vec<&'static str> {
    inventory::iter::<ServiceFactory>().map(|f| f.name).collect()
}
