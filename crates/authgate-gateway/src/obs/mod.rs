//! In-process observability.
//!
//! Counters and latency histograms for authorization decisions and HTTP
//! traffic, rendered in Prometheus text format by the `/metrics` handler,
//! and the tracing subscriber setup used by the binary.

pub mod logging;
pub mod metrics;

pub use metrics::GatewayMetrics;
