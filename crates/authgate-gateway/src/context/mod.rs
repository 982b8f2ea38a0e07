//! Request-scoped context shared across layers.
//!
//! Sessions live outside this crate; the gateway only needs to know who is
//! calling ([`PrincipalResolver`]) and from where ([`RequestOrigin`]).

pub mod origin;
pub mod principal;

pub use origin::RequestOrigin;
pub use principal::{HeaderPrincipalResolver, PrincipalResolver, SessionPrincipal};
