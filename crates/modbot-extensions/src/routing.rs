//! Routing surface types
//!
//! The transport layer is an external collaborator; it turns inbound chat
//! updates into [`Request`]s and renders [`Response`]s. This module only
//! models the handler set an extension contributes and how a request finds
//! its handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use modbot_store::AccountId;

/// An inbound request already resolved to a principal and a route key.
#[derive(Debug, Clone)]
pub struct Request {
    pub principal: AccountId,
    /// Route key: a command name (`"weather"`) or callback data
    /// (`"weather:refresh"`).
    pub route: String,
    pub args: Vec<String>,
}

impl Request {
    pub fn new(principal: AccountId, route: impl Into<String>) -> Self {
        Self {
            principal,
            route: route.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

/// What a handler asks the transport to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Text(String),
    Menu(Vec<MenuButton>),
    Empty,
}

/// Failure inside a handler; logged by the dispatcher, never a crash.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

/// A single request handler contributed by an extension.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn handle(&self, request: &Request) -> std::result::Result<Response, HandlerError>;
}

/// How a route key is matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutePattern {
    /// Exact command match.
    Command(String),
    /// Callback-data prefix match.
    CallbackPrefix(String),
}

impl RoutePattern {
    pub fn matches(&self, route: &str) -> bool {
        match self {
            RoutePattern::Command(command) => route == command,
            RoutePattern::CallbackPrefix(prefix) => route.starts_with(prefix.as_str()),
        }
    }
}

/// One route of an extension's surface.
#[derive(Clone)]
pub struct Route {
    pub pattern: RoutePattern,
    /// Permission checked at dispatch time; None means open to everyone.
    pub required_permission: Option<String>,
    pub handler: Arc<dyn RequestHandler>,
}

impl Route {
    pub fn new(pattern: RoutePattern, handler: Arc<dyn RequestHandler>) -> Self {
        Self {
            pattern,
            required_permission: None,
            handler,
        }
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permission = Some(permission.into());
        self
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("required_permission", &self.required_permission)
            .finish()
    }
}

/// The handler set an extension contributes once enabled.
#[derive(Debug, Clone, Default)]
pub struct RoutingSurface {
    routes: Vec<Route>,
}

impl RoutingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-command route.
    pub fn command(mut self, command: impl Into<String>, handler: Arc<dyn RequestHandler>) -> Self {
        self.routes
            .push(Route::new(RoutePattern::Command(command.into()), handler));
        self
    }

    /// Add a callback-prefix route.
    pub fn callback(mut self, prefix: impl Into<String>, handler: Arc<dyn RequestHandler>) -> Self {
        self.routes.push(Route::new(
            RoutePattern::CallbackPrefix(prefix.into()),
            handler,
        ));
        self
    }

    /// Add a pre-built route.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// First route matching the key, in registration order.
    pub fn find(&self, route: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.pattern.matches(route))
    }

    pub fn handler_count(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// A button an extension contributes to a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuButton {
    pub label: String,
    /// Route key sent when the button is pressed.
    pub route: String,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            route: route.into(),
        }
    }
}

/// Menu surface of one extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuContributions {
    /// Buttons merged into the main menu in integrated display mode.
    pub integrated: Vec<MenuButton>,
    /// Single entry button used in standalone display mode.
    pub entry: Option<MenuButton>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl RequestHandler for EchoHandler {
        async fn handle(&self, request: &Request) -> Result<Response, HandlerError> {
            Ok(Response::Text(request.route.clone()))
        }
    }

    #[test]
    fn test_command_pattern_is_exact() {
        let pattern = RoutePattern::Command("weather".to_string());
        assert!(pattern.matches("weather"));
        assert!(!pattern.matches("weather:refresh"));
    }

    #[test]
    fn test_callback_pattern_matches_prefix() {
        let pattern = RoutePattern::CallbackPrefix("weather:".to_string());
        assert!(pattern.matches("weather:refresh"));
        assert!(!pattern.matches("stats:refresh"));
    }

    #[test]
    fn test_surface_find_in_registration_order() {
        let surface = RoutingSurface::new()
            .command("weather", Arc::new(EchoHandler))
            .callback("weather:", Arc::new(EchoHandler));

        assert_eq!(surface.handler_count(), 2);
        let route = surface.find("weather:refresh").unwrap();
        assert!(matches!(route.pattern, RoutePattern::CallbackPrefix(_)));
        assert!(surface.find("unknown").is_none());
    }

    #[test]
    fn test_route_permission_builder() {
        let route = Route::new(
            RoutePattern::Command("panel".to_string()),
            Arc::new(EchoHandler),
        )
        .with_permission("admin.panel.access");
        assert_eq!(
            route.required_permission.as_deref(),
            Some("admin.panel.access")
        );
    }

    #[tokio::test]
    async fn test_handler_invocation() {
        let handler = EchoHandler;
        let response = handler.handle(&Request::new(1, "ping")).await.unwrap();
        assert_eq!(response, Response::Text("ping".to_string()));
    }
}
