use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// The global recorder can only be installed once per process.
static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

const COUNTERS: [(&str, &str); 5] = [
    (
        "forecast_requests_total",
        "Forecast requests by outcome (success, no_data, error).",
    ),
    (
        "forecast_cache_hits_total",
        "Requests served from the result cache.",
    ),
    (
        "forecast_cache_misses_total",
        "Requests that went through fetch + model.",
    ),
    ("trend_fetch_attempts_total", "Calls made to the trend source."),
    ("trend_fetch_failures_total", "Trend source calls that errored."),
];

/// Describe every series and register the counters at zero so they show up
/// on /metrics before the first request.
fn describe_all() {
    for (name, help) in COUNTERS {
        describe_counter!(name, help);
        counter!(name).increment(0);
    }
    describe_histogram!(
        "forecast_duration_ms",
        "End-to-end forecast latency in milliseconds."
    );
    describe_gauge!("forecast_cache_ttl_ms", "Configured result cache TTL.");
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install (or reuse) the Prometheus recorder and publish the cache TTL gauge.
    pub fn init(ttl_ms: u64) -> Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe_all();
                Ok::<_, BuildError>(handle)
            })?
            .clone();

        // Static gauge with current TTL (absolute TTL, no sliding refresh)
        gauge!("forecast_cache_ttl_ms").set(ttl_ms as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
