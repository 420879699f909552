//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, core::Collector};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // GitHub Metrics
    pub static ref GITHUB_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gitgame_auth_github_requests_total", "Total number of requests made to GitHub"),
        &["step", "outcome"]
    ).expect("metric can be created");
    pub static ref GITHUB_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "gitgame_auth_github_request_duration_seconds",
            "GitHub request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["step"]
    ).expect("metric can be created");

    // Token Metrics
    pub static ref TOKENS_ISSUED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gitgame_auth_tokens_issued_total", "Total number of signed tokens issued"),
        &["scope"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("gitgame_auth_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; already registered collectors are skipped.
pub fn init_metrics() {
    let collectors: [(&str, Box<dyn Collector>); 4] = [
        ("GITHUB_REQUESTS_TOTAL", Box::new(GITHUB_REQUESTS_TOTAL.clone())),
        (
            "GITHUB_REQUEST_DURATION_SECONDS",
            Box::new(GITHUB_REQUEST_DURATION_SECONDS.clone()),
        ),
        ("TOKENS_ISSUED_TOTAL", Box::new(TOKENS_ISSUED_TOTAL.clone())),
        ("ERRORS_TOTAL", Box::new(ERRORS_TOTAL.clone())),
    ];

    for (name, collector) in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(error) => tracing::warn!(metric = name, %error, "Failed to register metric"),
        }
    }

    tracing::info!("Metrics registry initialized");
}
