//! Prometheus metrics for the incident API.
//!
//! Covers HTTP traffic, incident ingest, status transitions and aggregation
//! latency. Everything is registered in [`PROMETHEUS_REGISTRY`] and exported
//! in text format by [`gather_metrics`].
//!
//! # Example
//! ```no_run
//! use safety_incident_manager::metrics::INCIDENTS_INGESTED_TOTAL;
//!
//! INCIDENTS_INGESTED_TOTAL.with_label_values(&["fire", "high"]).inc();
//! ```

mod middleware;

pub use middleware::track_http_metrics;

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};

const NAMESPACE: &str = "safety_incident_manager";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Incidents accepted from the detection pipeline
    ///
    /// Labels: incident_type, severity
    pub static ref INCIDENTS_INGESTED_TOTAL: CounterVec = CounterVec::new(
        Opts::new("incidents_ingested_total", "Total number of incidents ingested")
            .namespace(NAMESPACE),
        &["incident_type", "severity"]
    ).expect("Failed to create INCIDENTS_INGESTED_TOTAL metric");

    /// Status changes applied by operators
    ///
    /// Labels: from, to
    pub static ref STATUS_TRANSITIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("status_transitions_total", "Total number of incident status transitions")
            .namespace(NAMESPACE),
        &["from", "to"]
    ).expect("Failed to create STATUS_TRANSITIONS_TOTAL metric");

    /// Time spent computing aggregates
    ///
    /// Labels: aggregation (stats, by_sector, by_time)
    pub static ref AGGREGATION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "aggregation_duration_seconds",
            "Incident aggregation duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["aggregation"]
    ).expect("Failed to create AGGREGATION_DURATION_SECONDS metric");
}

/// Register all metrics with the global registry.
///
/// Calling it more than once returns an `AlreadyReg` error.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INCIDENTS_INGESTED_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(STATUS_TRANSITIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(AGGREGATION_DURATION_SECONDS.clone()))?;
    Ok(())
}

/// Export registered metrics in Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics output was not valid UTF-8: {}", e);
        String::new()
    })
}
