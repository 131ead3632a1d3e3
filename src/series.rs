//! # Series types
//! Historical observations, forecast points and the response that bundles them.
//!
//! Field names on the wire follow the charting convention the UI expects:
//! `ds` for the date, `y` for an observation, `yhat*` for forecast values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One historical measurement of search interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    #[serde(rename = "y")]
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("observation dates must be strictly increasing ({prev} then {next})")]
    NotIncreasing { prev: NaiveDate, next: NaiveDate },
    #[error("observation on {date} has invalid value {value}")]
    InvalidValue { date: NaiveDate, value: f64 },
}

/// Time-ordered observations with unique dates. Empty means "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HistoricalSeries(Vec<Observation>);

impl HistoricalSeries {
    /// Validates ordering and values; input must already be sorted.
    pub fn new(observations: Vec<Observation>) -> Result<Self, SeriesError> {
        for obs in &observations {
            if !obs.value.is_finite() || obs.value < 0.0 {
                return Err(SeriesError::InvalidValue {
                    date: obs.date,
                    value: obs.value,
                });
            }
        }
        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::NotIncreasing {
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self(observations))
    }

    /// Sorts by date first; duplicate dates are still rejected.
    pub fn from_unordered(mut observations: Vec<Observation>) -> Result<Self, SeriesError> {
        observations.sort_by_key(|o| o.date);
        Self::new(observations)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.0
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.0.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.0.last().map(|o| o.date)
    }
}

impl<'de> Deserialize<'de> for HistoricalSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Vec::<Observation>::deserialize(deserializer)?;
        HistoricalSeries::new(raw).map_err(serde::de::Error::custom)
    }
}

/// A fitted or predicted value with its uncertainty band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(rename = "ds")]
    pub date: NaiveDate,
    #[serde(rename = "yhat")]
    pub estimate: f64,
    #[serde(rename = "yhat_lower")]
    pub lower: f64,
    #[serde(rename = "yhat_upper")]
    pub upper: f64,
}

impl ForecastPoint {
    /// `lower <= estimate <= upper`, all finite.
    pub fn is_consistent(&self) -> bool {
        self.estimate.is_finite()
            && self.lower.is_finite()
            && self.upper.is_finite()
            && self.lower <= self.estimate
            && self.estimate <= self.upper
    }
}

/// What a successful forecast request returns. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub keyword: String,
    #[serde(rename = "historical_data")]
    pub historical: HistoricalSeries,
    #[serde(rename = "forecast_data")]
    pub forecast: Vec<ForecastPoint>,
}
