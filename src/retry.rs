//! # Retrying Fetcher
//! Throttle-then-call loop around the trend source.
//!
//! Every attempt, the first included, is preceded by a pause. The pause starts
//! at `initial_delay` and doubles after each failed attempt (5s, 10s, 20s with
//! the defaults). Any `Ok` from the source ends the loop, an empty series too.

use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::series::HistoricalSeries;
use crate::source::{DynTrendSource, Timeframe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
        }
    }

    /// Pause before each attempt, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let first = self.initial_delay;
        (0..self.max_attempts).map(move |i| first.saturating_mul(1u32 << i.min(31)))
    }

    /// Upper bound on time spent sleeping when every attempt fails.
    pub fn total_delay(&self) -> Duration {
        self.delays().fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }
}

/// Whole milliseconds for log fields, saturating.
fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Clone)]
pub struct RetryingFetcher {
    source: DynTrendSource,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(source: DynTrendSource, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn fetch(
        &self,
        keyword: &str,
        timeframe: &Timeframe,
    ) -> Result<HistoricalSeries, UpstreamError> {
        let mut last_error = String::from("no fetch attempt was made");
        let mut attempts = 0u32;

        for (i, delay) in self.policy.delays().enumerate() {
            attempts = i as u32 + 1;
            debug!(
                target: "trends",
                keyword,
                attempt = attempts,
                delay_ms = millis(delay),
                "throttling before fetch"
            );
            tokio::time::sleep(delay).await;

            counter!("trend_fetch_attempts_total").increment(1);
            match self.source.interest_over_time(keyword, timeframe).await {
                Ok(series) => {
                    debug!(
                        target: "trends",
                        keyword,
                        attempt = attempts,
                        points = series.len(),
                        "fetch ok"
                    );
                    return Ok(series);
                }
                Err(e) => {
                    counter!("trend_fetch_failures_total").increment(1);
                    warn!(
                        target: "trends",
                        keyword,
                        attempt = attempts,
                        max_attempts = self.policy.max_attempts,
                        source = self.source.name(),
                        error = %format!("{e:#}"),
                        "fetch attempt failed"
                    );
                    last_error = format!("{e:#}");
                }
            }
        }

        Err(UpstreamError {
            attempts,
            message: last_error,
        })
    }
}
