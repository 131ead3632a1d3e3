// src/source/mod.rs
pub mod http;
pub mod synthetic;

use std::{fmt, sync::Arc};

use anyhow::Result;
use chrono::{Months, NaiveDate};

use crate::config::ForecastConfig;
use crate::series::HistoricalSeries;

/// Trailing window of history to request, e.g. `today 3-m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeframe {
    months: u32,
}

impl Timeframe {
    pub const fn trailing_months(months: u32) -> Self {
        Self { months }
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    /// First day covered by the window when it ends on `today`.
    pub fn start_from(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_months(Months::new(self.months))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::trailing_months(3)
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "today {}-m", self.months)
    }
}

/// Upstream interest-over-time provider.
///
/// `Ok` with an empty series means the keyword has no measurable signal;
/// `Err` is a (possibly transient) failure and is retried by the fetcher.
#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    async fn interest_over_time(
        &self,
        keyword: &str,
        timeframe: &Timeframe,
    ) -> Result<HistoricalSeries>;
    fn name(&self) -> &'static str;
}

pub type DynTrendSource = Arc<dyn TrendSource>;

/// Factory: build the trend source according to config and environment.
///
/// * If `TRENDS_TEST_MODE=mock`, returns the deterministic synthetic source.
/// * Otherwise talks to the configured HTTP endpoint.
pub fn build_source_from_config(cfg: &ForecastConfig) -> Result<DynTrendSource> {
    if std::env::var("TRENDS_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::info!(target: "trends", "using synthetic trend source (mock mode)");
        return Ok(Arc::new(synthetic::SyntheticSource::from_env()));
    }

    let source = http::HttpTrendSource::from_config(&cfg.trends)?;
    tracing::info!(target: "trends", endpoint = %cfg.trends.endpoint, "using http trend source");
    Ok(Arc::new(source))
}
