//! Prometheus metrics registry for the IoT platform.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and hand it to
//! the router. Exposed at `GET /metrics` in Prometheus text exposition
//! format (`text/plain; version=0.0.4`).

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Devices successfully created through the API.
    pub devices_created_total: Counter,
    /// Sensor readings successfully recorded through the API.
    pub readings_created_total: Counter,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds.
    pub http_request_duration: Histogram,
    pub registry: Registry,
}

impl AppMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let devices_created_total = Counter::with_opts(Opts::new(
            "iot_platform_devices_created_total",
            "Devices created",
        ))?;

        let readings_created_total = Counter::with_opts(Opts::new(
            "iot_platform_readings_created_total",
            "Sensor readings recorded",
        ))?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "iot_platform_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = Histogram::with_opts(
            HistogramOpts::new(
                "iot_platform_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(devices_created_total.clone()))?;
        registry.register(Box::new(readings_created_total.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            devices_created_total,
            readings_created_total,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap_or_default())
    }
}

/// Axum middleware recording request count and latency.
///
/// Labels use the matched route template (`/devices/:id`) when available so
/// path cardinality stays bounded.
pub async fn track_http(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let started = Instant::now();
    let response = next.run(request).await;

    metrics
        .http_request_duration
        .observe(started.elapsed().as_secs_f64());
    metrics
        .http_requests_total
        .with_label_values(&[&method, &path, response.status().as_str()])
        .inc();

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_register_without_error() {
        let metrics = AppMetrics::new();
        assert!(metrics.is_ok(), "AppMetrics::new() failed: {:?}", metrics.err());
    }

    #[test]
    fn render_contains_counter_after_increment() {
        let metrics = AppMetrics::new().unwrap();
        metrics.devices_created_total.inc_by(2.0);
        let output = metrics.render().unwrap();
        assert!(output.contains("iot_platform_devices_created_total 2"));
    }

    #[test]
    fn http_requests_counter_vec_labels_work() {
        let metrics = AppMetrics::new().unwrap();
        metrics
            .http_requests_total
            .with_label_values(&["GET", "/devices", "200"])
            .inc();
        let val = metrics
            .http_requests_total
            .with_label_values(&["GET", "/devices", "200"])
            .get();
        assert!((val - 1.0).abs() < f64::EPSILON);
    }
}
