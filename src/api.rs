use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::cache::CacheEntryInfo;
use crate::error::ForecastError;
use crate::pipeline::{CacheStatus, ForecastPipeline};

pub const CACHE_HEADER: &str = "x-forecast-cache";
pub const OUTCOME_HEADER: &str = "x-forecast-outcome";

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<ForecastPipeline>,
    default_periods: i64,
}

impl AppState {
    pub fn new(pipeline: Arc<ForecastPipeline>, default_periods: i64) -> Self {
        Self {
            pipeline,
            default_periods,
        }
    }

    pub fn pipeline(&self) -> &Arc<ForecastPipeline> {
        &self.pipeline
    }
}

/// Public routes: health + forecast.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/forecast/{keyword}", get(forecast))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Diagnostics, mounted only when `DEBUG_ROUTES=1`.
pub fn debug_router(state: AppState) -> Router {
    Router::new()
        .route("/debug/cache", get(debug_cache))
        .with_state(state)
}

/// Every outcome is a 200 with a JSON body; the headers tell them apart.
async fn forecast(
    State(state): State<AppState>,
    Path(keyword): Path<String>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    let (outcome, cache) = match parse_periods(q.get("periods"), state.default_periods) {
        Ok(periods) => state.pipeline.run(&keyword, periods).await,
        Err(e) => (state.pipeline.reject(e), CacheStatus::Miss),
    };

    let label = outcome.label();
    let mut resp = Json(outcome).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static(CACHE_HEADER),
        HeaderValue::from_static(cache.as_str()),
    );
    headers.insert(
        HeaderName::from_static(OUTCOME_HEADER),
        HeaderValue::from_static(label),
    );
    resp
}

fn parse_periods(raw: Option<&String>, default: i64) -> Result<i64, ForecastError> {
    match raw.map(|s| s.trim()) {
        None | Some("") => Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| ForecastError::InvalidPeriods(s.to_string())),
    }
}

async fn debug_cache(State(state): State<AppState>) -> Json<Vec<CacheEntryInfo>> {
    Json(state.pipeline.cache().snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_default_and_passthrough() {
        assert_eq!(parse_periods(None, 30), Ok(30));
        assert_eq!(parse_periods(Some(&"".to_string()), 30), Ok(30));
        assert_eq!(parse_periods(Some(&" 7 ".to_string()), 30), Ok(7));
        // out-of-range values are not clamped here
        assert_eq!(parse_periods(Some(&"-5".to_string()), 30), Ok(-5));
        assert_eq!(
            parse_periods(Some(&"ten".to_string()), 30),
            Err(ForecastError::InvalidPeriods("ten".into()))
        );
    }
}
