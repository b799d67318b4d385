//! Role-based access control for modbot
//!
//! Single source of truth for "who can do what": a compiled-in permission
//! catalog, canonical role definitions, the engine that seeds and queries
//! the persistent role graph, and the narrow facade the rest of the host
//! calls. Permission checks fail closed; role queries fail open to the
//! configured default role.

pub mod audit;
pub mod cache;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod facade;
pub mod roles;

pub use audit::{actions, AuditRecorder, SYSTEM_ACTOR};
pub use cache::PermissionCache;
pub use catalog::{catalog, PermissionCategory, PermissionDef};
pub use engine::{RbacDiagnostics, RbacEngine, RbacOptions, RoleDiagnostics};
pub use error::{RbacError, Result};
pub use facade::AuthFacade;
pub use roles::{canonical_roles, Grants, RoleSpec, ADMIN, SUPER_ADMIN, USER};
