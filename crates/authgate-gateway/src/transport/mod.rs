//! HTTP request lifecycle hooks.
//!
//! The interceptor wraps every routed request, measures it, and writes one
//! traffic ledger entry for each non-static request.

pub mod interceptor;

pub use interceptor::record_traffic;
