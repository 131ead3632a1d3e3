// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod contract;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod series;
pub mod source;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::contract::{ForecastOutcome, ForecastPayload};
pub use crate::error::{ForecastError, ModelError, UpstreamError};
pub use crate::pipeline::{CacheStatus, ForecastPipeline};
pub use crate::series::{ForecastPoint, ForecastResponse, HistoricalSeries, Observation};

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::config::ForecastConfig;
use crate::metrics::Metrics;

/// `DEBUG_ROUTES=1` mounts `/metrics` and `/debug/*`.
pub fn debug_routes_enabled() -> bool {
    std::env::var("DEBUG_ROUTES")
        .map(|v| v == "1")
        .unwrap_or(false)
}

/// Build the full application router from config + environment.
///
/// Used by the Shuttle entrypoint and by integration tests (in-process, no sockets).
pub async fn app() -> anyhow::Result<Router> {
    let cfg = ForecastConfig::load_default()?;
    let source = source::build_source_from_config(&cfg)?;
    let pipeline = Arc::new(ForecastPipeline::from_config(&cfg, source));
    let state = AppState::new(pipeline, cfg.default_periods);

    let mut router = api::router(state.clone());
    if debug_routes_enabled() {
        let metrics = Metrics::init(cfg.cache_ttl_ms)?;
        router = router
            .merge(metrics.router())
            .merge(api::debug_router(state));
    }

    info!(
        cache_ttl_ms = cfg.cache_ttl_ms,
        retry_attempts = cfg.retry_attempts,
        retry_initial_delay_ms = cfg.retry_initial_delay_ms,
        timeframe = %cfg.timeframe(),
        debug_routes = debug_routes_enabled(),
        "forecast app configured"
    );
    Ok(router)
}
