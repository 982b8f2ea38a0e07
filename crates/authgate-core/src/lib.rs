//! authgate core: the authorization request/result model, the typed context
//! bag, the error surface, and the local fallback rules.
//!
//! No transport or runtime dependencies live here; the rules are evaluated
//! the same way by the gateway, by tests, and by any embedding host.
//!
//! # Failure surface
//! `unwrap`, `expect` and `panic!` are compile-denied. Fallible paths return
//! `AuthGateError`, and [`fallback::evaluate`] is total: missing or malformed
//! context resolves to documented defaults instead of an error.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod context;
pub mod decision;
pub mod error;
pub mod fallback;

pub use context::{AuthContext, ContextValue};
pub use decision::{AuthorizationRequest, AuthorizationResult, Verdict};
pub use error::{AuthGateError, ErrorKind, Result};
