//! # Response contract
//! The outcome of a forecast request, independent of transport.
//!
//! Internally the outcome has three variants. On the wire both failure kinds
//! flatten to `{ "error": "<message>" }`; success is the bare response object.

use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{ForecastError, NO_DATA_MESSAGE};
use crate::series::ForecastResponse;

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastOutcome {
    Success(Arc<ForecastResponse>),
    NoData,
    Failed(ForecastError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ForecastOutcome {
    /// Label for metrics and the `X-Forecast-Outcome` header.
    pub fn label(&self) -> &'static str {
        match self {
            ForecastOutcome::Success(_) => "success",
            ForecastOutcome::NoData => "no_data",
            ForecastOutcome::Failed(_) => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ForecastOutcome::Success(_))
    }
}

impl From<ForecastError> for ForecastOutcome {
    fn from(e: ForecastError) -> Self {
        match e {
            ForecastError::NoData => ForecastOutcome::NoData,
            other => ForecastOutcome::Failed(other),
        }
    }
}

impl Serialize for ForecastOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ForecastOutcome::Success(resp) => resp.as_ref().serialize(serializer),
            ForecastOutcome::NoData => ErrorBody {
                error: NO_DATA_MESSAGE,
            }
            .serialize(serializer),
            ForecastOutcome::Failed(e) => ErrorBody {
                error: &e.to_string(),
            }
            .serialize(serializer),
        }
    }
}

/// Consumer-side view of the wire payload.
///
/// Deserializing forces a branch on the variant: a client can only reach
/// `historical_data`/`forecast_data` through `Success`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ForecastPayload {
    Error { error: String },
    Success(ForecastResponse),
}

impl ForecastPayload {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ForecastPayload::Error { error } if error == NO_DATA_MESSAGE)
    }

    pub fn into_result(self) -> Result<ForecastResponse, String> {
        match self {
            ForecastPayload::Success(r) => Ok(r),
            ForecastPayload::Error { error } => Err(error),
        }
    }
}
