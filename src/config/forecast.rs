// src/config/forecast.rs
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use crate::source::Timeframe;

pub const DEFAULT_CONFIG_PATH: &str = "config/forecast.toml";
pub const ENV_CONFIG_PATH: &str = "FORECAST_CONFIG_PATH";

const ENV_CACHE_TTL_MS: &str = "FORECAST_CACHE_TTL_MS";
const ENV_RETRY_BASE_MS: &str = "FORECAST_RETRY_BASE_MS";
const ENV_RETRY_ATTEMPTS: &str = "FORECAST_RETRY_ATTEMPTS";
const ENV_TRENDS_ENDPOINT: &str = "TRENDS_ENDPOINT";

fn default_interval_width() -> f64 {
    0.80
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Absolute TTL of cached forecasts.
    pub cache_ttl_ms: u64,
    pub retry_attempts: u32,
    /// Pause before the first fetch attempt; doubles after each failure.
    pub retry_initial_delay_ms: u64,
    /// Horizon used when the request has no `periods`.
    pub default_periods: i64,
    pub timeframe_months: u32,
    /// Width of the uncertainty band, in (0, 1).
    pub interval_width: f64,
    pub trends: TrendsConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 600_000,
            retry_attempts: 3,
            retry_initial_delay_ms: 5_000,
            default_periods: 30,
            timeframe_months: 3,
            interval_width: default_interval_width(),
            trends: TrendsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendsConfig {
    pub endpoint: String,
    /// Host language, e.g. "en-US".
    pub hl: String,
    /// Timezone offset in minutes, as the trends API expects it.
    pub tz: i32,
    pub timeout_secs: u64,
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/trends/interest".to_string(),
            hl: "en-US".to_string(),
            tz: 360,
            timeout_secs: 10,
        }
    }
}

impl ForecastConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: ForecastConfig = toml::from_str(s).context("parsing forecast config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading forecast config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $FORECAST_CONFIG_PATH (must exist)
    /// 2) config/forecast.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = parse_env(ENV_CACHE_TTL_MS) {
            self.cache_ttl_ms = v;
        }
        if let Some(v) = parse_env(ENV_RETRY_BASE_MS) {
            self.retry_initial_delay_ms = v;
        }
        if let Some(v) = parse_env(ENV_RETRY_ATTEMPTS) {
            self.retry_attempts = v;
        }
        if let Ok(v) = std::env::var(ENV_TRENDS_ENDPOINT) {
            if !v.trim().is_empty() {
                self.trends.endpoint = v.trim().to_string();
            }
        }
    }

    fn sanitize(&mut self) {
        self.retry_attempts = self.retry_attempts.max(1);
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            self.interval_width = default_interval_width();
        }
        if self.default_periods <= 0 {
            self.default_periods = 30;
        }
        self.timeframe_months = self.timeframe_months.max(1);
        self.trends.timeout_secs = self.trends.timeout_secs.max(1);
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
    }

    pub fn timeframe(&self) -> Timeframe {
        Timeframe::trailing_months(self.timeframe_months)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<T>().ok())
}
