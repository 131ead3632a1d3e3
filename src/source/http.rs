use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::TrendsConfig;
use crate::series::{HistoricalSeries, Observation};
use crate::source::{Timeframe, TrendSource};

#[derive(Debug, Deserialize)]
struct TimelineBody {
    #[serde(default)]
    timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    date: NaiveDate,
    value: f64,
    #[serde(default)]
    is_partial: bool,
}

/// Interest-over-time over a JSON endpoint (a trends proxy/scraper service).
pub struct HttpTrendSource {
    client: reqwest::Client,
    endpoint: String,
    hl: String,
    tz: i32,
}

impl HttpTrendSource {
    pub fn from_config(cfg: &TrendsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("trend-forecaster/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("building trends http client")?;
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            hl: cfg.hl.clone(),
            tz: cfg.tz,
        })
    }

    fn parse_timeline(body: &str) -> Result<HistoricalSeries> {
        let parsed: TimelineBody =
            serde_json::from_str(body).context("parsing trends timeline json")?;

        let partial = parsed.timeline.iter().filter(|p| p.is_partial).count();
        if partial > 0 {
            tracing::debug!(target: "trends", partial, "timeline contains partial points");
        }

        let observations = parsed
            .timeline
            .into_iter()
            .map(|p| Observation::new(p.date, p.value))
            .collect::<Vec<_>>();
        HistoricalSeries::from_unordered(observations).context("validating trends timeline")
    }
}

#[async_trait]
impl TrendSource for HttpTrendSource {
    async fn interest_over_time(
        &self,
        keyword: &str,
        timeframe: &Timeframe,
    ) -> Result<HistoricalSeries> {
        let tf = timeframe.to_string();
        let tz = self.tz.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("keyword", keyword),
                ("timeframe", tf.as_str()),
                ("hl", self.hl.as_str()),
                ("tz", tz.as_str()),
            ])
            .send()
            .await
            .context("trends http get()")?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(anyhow!("rate limited by trends endpoint (HTTP 429)"));
        }
        if !status.is_success() {
            return Err(anyhow!("trends endpoint returned HTTP {status}"));
        }

        let body = resp.text().await.context("trends http .text()")?;
        Self::parse_timeline(&body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
