//! # Forecast Pipeline
//! cache check → fetch (with retries) → model fit/predict → respond + cache.
//!
//! Only successful responses are written to the cache. The cache key is the
//! trimmed keyword alone, so a hit is returned as originally forecast even
//! when the caller asks for a different `periods`.

use std::{ops::RangeInclusive, sync::Arc, time::Instant};

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::config::ForecastConfig;
use crate::contract::ForecastOutcome;
use crate::error::{ForecastError, ModelError};
use crate::forecast::{validate_points, DynForecastModel, LinearTrendModel};
use crate::retry::RetryingFetcher;
use crate::series::{ForecastPoint, ForecastResponse, HistoricalSeries};
use crate::source::{DynTrendSource, Timeframe};

/// Horizon range the UI offers. Not enforced, only logged.
pub const RECOMMENDED_PERIODS: RangeInclusive<i64> = 7..=90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A successful forecast and where it came from.
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Arc<ForecastResponse>,
    pub cache: CacheStatus,
}

pub struct ForecastPipeline {
    cache: Arc<ResultCache>,
    fetcher: RetryingFetcher,
    model: DynForecastModel,
    timeframe: Timeframe,
}

impl ForecastPipeline {
    pub fn new(
        cache: Arc<ResultCache>,
        fetcher: RetryingFetcher,
        model: DynForecastModel,
        timeframe: Timeframe,
    ) -> Self {
        Self {
            cache,
            fetcher,
            model,
            timeframe,
        }
    }

    /// Wire the default collaborators (linear model, fresh cache) from config.
    pub fn from_config(cfg: &ForecastConfig, source: DynTrendSource) -> Self {
        Self::new(
            Arc::new(ResultCache::with_ttl(cfg.cache_ttl())),
            RetryingFetcher::new(source, cfg.retry_policy()),
            Arc::new(LinearTrendModel::new(cfg.interval_width)),
            cfg.timeframe(),
        )
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub async fn forecast(&self, keyword: &str, periods: i64) -> Result<Served, ForecastError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ForecastError::InvalidKeyword);
        }

        if let Some(hit) = self.cache.get(keyword) {
            counter!("forecast_cache_hits_total").increment(1);
            debug!(target: "forecast", keyword, periods, "cache hit");
            return Ok(Served {
                response: hit,
                cache: CacheStatus::Hit,
            });
        }
        counter!("forecast_cache_misses_total").increment(1);

        if !RECOMMENDED_PERIODS.contains(&periods) {
            debug!(
                target: "forecast",
                keyword,
                periods,
                "periods outside the recommended 7..=90 range, passing through"
            );
        }

        let history = self.fetcher.fetch(keyword, &self.timeframe).await?;
        if history.is_empty() {
            info!(target: "forecast", keyword, "no trend data for keyword");
            return Err(ForecastError::NoData);
        }

        let (history, forecast) = self.fit_and_predict(history, periods).await?;
        let response = Arc::new(ForecastResponse {
            keyword: keyword.to_string(),
            historical: history,
            forecast,
        });
        self.cache.put(keyword, Arc::clone(&response));

        info!(
            target: "forecast",
            keyword,
            periods,
            historical = response.historical.len(),
            forecast = response.forecast.len(),
            "forecast computed"
        );
        Ok(Served {
            response,
            cache: CacheStatus::Miss,
        })
    }

    /// Boundary variant: never fails, records request metrics.
    pub async fn run(&self, keyword: &str, periods: i64) -> (ForecastOutcome, CacheStatus) {
        let t0 = Instant::now();
        let (outcome, cache) = match self.forecast(keyword, periods).await {
            Ok(served) => (ForecastOutcome::Success(served.response), served.cache),
            Err(e) => {
                match &e {
                    ForecastError::Upstream(_) | ForecastError::Model(_) => {
                        warn!(target: "forecast", keyword, kind = e.kind(), error = %e, "forecast failed")
                    }
                    _ => debug!(target: "forecast", keyword, kind = e.kind(), "forecast not available"),
                }
                (ForecastOutcome::from(e), CacheStatus::Miss)
            }
        };

        record_request(&outcome, t0);
        (outcome, cache)
    }

    /// Boundary for requests rejected before reaching the pipeline (e.g. a
    /// malformed `periods`). Counted like any other outcome.
    pub fn reject(&self, err: ForecastError) -> ForecastOutcome {
        let t0 = Instant::now();
        debug!(target: "forecast", kind = err.kind(), error = %err, "request rejected");
        let outcome = ForecastOutcome::from(err);
        record_request(&outcome, t0);
        outcome
    }

    /// Runs the model on the blocking pool; gives the history back with the points.
    async fn fit_and_predict(
        &self,
        history: HistoricalSeries,
        periods: i64,
    ) -> Result<(HistoricalSeries, Vec<ForecastPoint>), ModelError> {
        let model = Arc::clone(&self.model);
        let (history, result) = tokio::task::spawn_blocking(move || {
            let points = model.fit(&history).and_then(|fitted| fitted.predict(periods));
            (history, points)
        })
        .await
        .map_err(|e| ModelError::Failed(format!("forecast task aborted: {e}")))?;

        let points = result?;
        validate_points(&points)?;
        Ok((history, points))
    }
}

fn record_request(outcome: &ForecastOutcome, t0: Instant) {
    counter!("forecast_requests_total", "outcome" => outcome.label()).increment(1);
    histogram!("forecast_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
}
