//! Deterministic trend source for local runs and tests (`TRENDS_TEST_MODE=mock`).

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Utc};

use crate::series::{HistoricalSeries, Observation};
use crate::source::{Timeframe, TrendSource};

/// Daily series derived from the keyword: level + drift + weekly cycle, 0..=100.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    end: Option<NaiveDate>,
    empty: HashSet<String>,
    failing: HashSet<String>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `TRENDS_MOCK_EMPTY` / `TRENDS_MOCK_FAIL` (comma-separated keywords).
    pub fn from_env() -> Self {
        let list = |var: &str| {
            std::env::var(var)
                .map(|v| parse_keyword_list(&v))
                .unwrap_or_default()
        };
        Self {
            end: None,
            empty: list("TRENDS_MOCK_EMPTY"),
            failing: list("TRENDS_MOCK_FAIL"),
        }
    }

    /// Pin the last observed day instead of "yesterday".
    pub fn ending_on(mut self, end: NaiveDate) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_empty<S: AsRef<str>>(mut self, keyword: S) -> Self {
        self.empty.insert(keyword.as_ref().trim().to_ascii_lowercase());
        self
    }

    pub fn with_failing<S: AsRef<str>>(mut self, keyword: S) -> Self {
        self.failing
            .insert(keyword.as_ref().trim().to_ascii_lowercase());
        self
    }

    fn series_for(&self, keyword: &str, timeframe: &Timeframe) -> Result<HistoricalSeries> {
        let end = match self.end {
            Some(d) => d,
            None => Utc::now()
                .date_naive()
                .checked_sub_days(Days::new(1))
                .unwrap_or(NaiveDate::MIN),
        };
        let start = timeframe.start_from(end);

        let mut hasher = DefaultHasher::new();
        keyword.to_ascii_lowercase().hash(&mut hasher);
        let h = hasher.finish();
        let level = 20.0 + (h % 50) as f64;
        let drift = ((h >> 8) % 21) as f64 / 100.0 - 0.1;

        let mut out = Vec::new();
        let mut day = start;
        let mut i = 0u32;
        while day <= end {
            let weekly = 5.0
                * (2.0 * std::f64::consts::PI * day.weekday().num_days_from_monday() as f64
                    / 7.0)
                    .sin();
            let v = (level + drift * i as f64 + weekly).round().clamp(0.0, 100.0);
            out.push(Observation::new(day, v));
            day = match day.succ_opt() {
                Some(next) => next,
                None => break,
            };
            i += 1;
        }
        Ok(HistoricalSeries::new(out)?)
    }
}

#[async_trait]
impl TrendSource for SyntheticSource {
    async fn interest_over_time(
        &self,
        keyword: &str,
        timeframe: &Timeframe,
    ) -> Result<HistoricalSeries> {
        let key = keyword.trim().to_ascii_lowercase();
        if self.failing.contains(&key) {
            bail!("synthetic upstream failure for '{keyword}'");
        }
        if self.empty.contains(&key) {
            return Ok(HistoricalSeries::empty());
        }
        self.series_for(keyword, timeframe)
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}

fn parse_keyword_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[tokio::test]
    async fn deterministic_daily_series_over_window() {
        let src = SyntheticSource::new().ending_on(end());
        let a = src
            .interest_over_time("Outsystems", &Timeframe::default())
            .await
            .unwrap();
        let b = src
            .interest_over_time("outsystems", &Timeframe::default())
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.first_date(), NaiveDate::from_ymd_opt(2025, 3, 30));
        assert_eq!(a.last_date(), Some(end()));
        assert_eq!(a.len(), 93);
        assert!(a
            .observations()
            .iter()
            .all(|o| (0.0..=100.0).contains(&o.value)));
    }

    #[tokio::test]
    async fn configured_empty_and_failing_keywords() {
        let src = SyntheticSource::new()
            .with_empty("nothing here")
            .with_failing("Flaky");
        let tf = Timeframe::default();
        assert!(src
            .interest_over_time("Nothing Here", &tf)
            .await
            .unwrap()
            .is_empty());
        assert!(src.interest_over_time("flaky", &tf).await.is_err());
    }

    #[test]
    fn keyword_list_is_trimmed_and_lowercased() {
        let set = parse_keyword_list(" Foo, ,BAR ,");
        assert_eq!(set.len(), 2);
        assert!(set.contains("foo") && set.contains("bar"));
    }
}
