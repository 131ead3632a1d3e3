//! Error taxonomy for the forecast pipeline.

use thiserror::Error;

/// Message shown to users when the trend source has nothing for a keyword.
pub const NO_DATA_MESSAGE: &str = "No data found. Try another keyword.";

/// Every fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trend data source failed after {attempts} attempt(s): {message}")]
pub struct UpstreamError {
    pub attempts: u32,
    /// Description of the last attempt's error.
    pub message: String,
}

/// The forecasting stage could not produce a usable forecast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("need at least {needed} data points to fit a forecast, got {got}")]
    InsufficientData { needed: usize, got: usize },
    #[error("cannot forecast {0} periods")]
    InvalidHorizon(i64),
    #[error("model produced an inconsistent point for {0}")]
    InconsistentOutput(chrono::NaiveDate),
    #[error("model failed: {0}")]
    Failed(String),
}

/// Terminal failure of one forecast request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("Keyword must not be empty.")]
    InvalidKeyword,
    #[error("periods must be an integer, got '{0}'.")]
    InvalidPeriods(String),
    #[error("{}", NO_DATA_MESSAGE)]
    NoData,
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ForecastError {
    /// Short label used for metrics and the outcome header.
    pub fn kind(&self) -> &'static str {
        match self {
            ForecastError::NoData => "no_data",
            ForecastError::InvalidKeyword => "invalid_keyword",
            ForecastError::InvalidPeriods(_) => "invalid_periods",
            ForecastError::Upstream(_) => "upstream",
            ForecastError::Model(_) => "model",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_visible_messages() {
        assert_eq!(ForecastError::NoData.to_string(), NO_DATA_MESSAGE);

        let up = ForecastError::from(UpstreamError {
            attempts: 3,
            message: "HTTP 429 Too Many Requests".into(),
        });
        let msg = up.to_string();
        assert!(msg.contains("HTTP 429 Too Many Requests"), "{msg}");
        assert!(msg.contains("3 attempt"), "{msg}");

        let model = ForecastError::from(ModelError::InsufficientData { needed: 2, got: 1 });
        assert!(model.to_string().contains("at least 2"));
        assert_eq!(model.kind(), "model");
    }
}
