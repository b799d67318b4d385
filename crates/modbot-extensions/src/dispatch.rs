//! Request dispatch with lifecycle and permission guards
//!
//! Disable is enforced here, at the dispatch boundary: a route belonging to
//! a disabled extension is refused even though its surface is still
//! resident. Route-level permissions are checked through the authorization
//! facade and fail closed.

use std::sync::Arc;

use tracing::{debug, error};

use modbot_rbac::AuthFacade;

use crate::manager::ExtensionManager;
use crate::routing::{Request, Response};

/// Outcome of routing one request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A handler ran and produced a response.
    Handled(Response),
    /// No loaded surface matches the route key.
    NoRoute,
    /// The matching route belongs to a disabled extension.
    ExtensionDisabled { id: String },
    /// The principal lacks the route's required permission.
    Denied { permission: String },
    /// The handler itself failed; logged, never propagated.
    HandlerError(String),
}

/// Routes requests to extension handlers.
#[derive(Clone)]
pub struct Dispatcher {
    manager: Arc<ExtensionManager>,
    facade: AuthFacade,
}

impl Dispatcher {
    pub fn new(manager: Arc<ExtensionManager>, facade: AuthFacade) -> Self {
        Self { manager, facade }
    }

    /// Resolve and run the handler for a request.
    pub async fn dispatch(&self, request: &Request) -> DispatchOutcome {
        let Some(resolved) = self.manager.find_route(&request.route) else {
            debug!(route = %request.route, "no route");
            return DispatchOutcome::NoRoute;
        };

        // enabled-state is checked per dispatch, not at mount time
        if !self.manager.is_enabled(&resolved.extension_id) {
            debug!(
                route = %request.route,
                extension = %resolved.extension_id,
                "route refused, extension disabled"
            );
            return DispatchOutcome::ExtensionDisabled {
                id: resolved.extension_id,
            };
        }

        if let Some(permission) = &resolved.required_permission {
            if !self
                .facade
                .check_permission(request.principal, permission)
                .await
            {
                debug!(
                    principal = request.principal,
                    permission = %permission,
                    "route refused, permission missing"
                );
                return DispatchOutcome::Denied {
                    permission: permission.clone(),
                };
            }
        }

        match resolved.handler.handle(request).await {
            Ok(response) => DispatchOutcome::Handled(response),
            Err(err) => {
                error!(
                    route = %request.route,
                    extension = %resolved.extension_id,
                    error = %err,
                    "handler failed"
                );
                DispatchOutcome::HandlerError(err.to_string())
            }
        }
    }
}
