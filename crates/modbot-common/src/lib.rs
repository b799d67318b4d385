//! Shared plumbing for the modbot workspace
//!
//! Hosts the cross-crate service registration types (via `inventory`) and the
//! tracing initialization helper. Kept free of other modbot dependencies so
//! every crate can depend on it without cycles.

pub mod di;
pub mod logging;

pub use di::{collect_services, discovered_factory_count, list_factories, ServiceEntry, ServiceFactory};
