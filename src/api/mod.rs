//! API layer
//!
//! HTTP handlers that sit beside the login flow:
//! - Metrics (Prometheus)

pub mod metrics;

pub use metrics::metrics_router;
