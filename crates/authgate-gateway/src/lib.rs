//! authgate gateway library entry.
//!
//! Wires configuration, the remote decision adapter, the decision point,
//! the audit/traffic ledgers, and the HTTP middleware into one stack. Used by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod engine;
pub mod ledger;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod remote;
pub mod router;
pub mod transport;
