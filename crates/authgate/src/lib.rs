//! Top-level facade crate for authgate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use authgate_core::*;
}

pub mod gateway {
    pub use authgate_gateway::*;
}
