//! Route-level authorization.
//!
//! [`PermissionGuard`] wraps a handler so the decision point runs before the
//! handler does; denials short-circuit with 401/403.

pub mod guard;

pub use guard::{require_permission, PermissionGuard};
