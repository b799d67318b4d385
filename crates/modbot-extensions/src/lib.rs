//! Extension lifecycle for modbot
//!
//! Owns the set of installed extensions and their runtime on/off state.
//! Extensions register a factory at compile time (push model) or are
//! described by an `extension.toml` manifest in the extensions directory;
//! the lifecycle manager instantiates enabled ones and exposes the routing
//! surface each contributes. Disabling an extension is a real guard at the
//! dispatch boundary, not a router unmount.

pub mod di;
pub mod dispatch;
pub mod error;
pub mod manager;
pub mod registry;
pub mod routing;
pub mod traits;

pub use dispatch::{DispatchOutcome, Dispatcher};
pub use error::{ExtensionError, Result};
pub use manager::{ExtensionInfo, ExtensionManager, ExtensionState, ExtensionStats};
pub use registry::{
    DiscoveryReport, ExtensionFactory, ExtensionManifest, ExtensionRegistry, StaticExtension,
};
pub use routing::{
    HandlerError, MenuButton, MenuContributions, Request, RequestHandler, Response, Route,
    RoutePattern, RoutingSurface,
};
pub use traits::{Extension, ExtensionContext};
