// src/forecast/mod.rs
pub mod linear;

use std::sync::Arc;

use crate::error::ModelError;
use crate::series::{ForecastPoint, HistoricalSeries};

pub use linear::LinearTrendModel;

/// Forecasting model collaborator: fit on history, then predict.
///
/// Implementations are CPU-bound and synchronous; the pipeline runs them on
/// the blocking pool.
pub trait ForecastModel: Send + Sync + 'static {
    fn fit(&self, history: &HistoricalSeries) -> Result<Box<dyn FittedModel>, ModelError>;
    fn name(&self) -> &'static str;
}

pub trait FittedModel: Send {
    /// Points for every historical date (back-fitted) followed by `periods`
    /// daily points after the last historical date.
    fn predict(&self, periods: i64) -> Result<Vec<ForecastPoint>, ModelError>;
}

pub type DynForecastModel = Arc<dyn ForecastModel>;

/// Check band ordering, finiteness and strictly increasing dates.
pub fn validate_points(points: &[ForecastPoint]) -> Result<(), ModelError> {
    for p in points {
        if !p.is_consistent() {
            return Err(ModelError::InconsistentOutput(p.date));
        }
    }
    for pair in points.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(ModelError::InconsistentOutput(pair[1].date));
        }
    }
    Ok(())
}
