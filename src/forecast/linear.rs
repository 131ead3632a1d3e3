//! Least-squares linear trend with residual-based intervals.
//!
//! Time is measured in days since the first observation, so gaps in the
//! history are handled without resampling. The band half-width is
//! `z * sigma` on the historical span and widens with `sqrt(1 + h/n)` for the
//! h-th future day.

use chrono::{Days, NaiveDate};

use crate::error::ModelError;
use crate::forecast::{FittedModel, ForecastModel};
use crate::series::{ForecastPoint, HistoricalSeries};

/// Longest horizon the model accepts (ten years of days).
pub const MAX_HORIZON_DAYS: i64 = 3_650;

#[derive(Debug, Clone, Copy)]
pub struct LinearTrendModel {
    interval_width: f64,
}

impl Default for LinearTrendModel {
    fn default() -> Self {
        Self::new(0.80)
    }
}

impl LinearTrendModel {
    pub fn new(interval_width: f64) -> Self {
        Self { interval_width }
    }

    pub fn interval_width(&self) -> f64 {
        self.interval_width
    }
}

/// Two-sided normal quantile for common interval widths (approximate).
fn z_for_width(width: f64) -> f64 {
    match width {
        x if x >= 0.99 => 2.576,
        x if x >= 0.95 => 1.96,
        x if x >= 0.90 => 1.645,
        x if x >= 0.80 => 1.282,
        x if x >= 0.50 => 0.674,
        _ => 0.253,
    }
}

impl ForecastModel for LinearTrendModel {
    fn fit(&self, history: &HistoricalSeries) -> Result<Box<dyn FittedModel>, ModelError> {
        let obs = history.observations();
        let n = obs.len();
        let (first, last) = match (obs.first(), obs.last()) {
            (Some(f), Some(l)) if n >= 2 => (f.date, l.date),
            _ => return Err(ModelError::InsufficientData { needed: 2, got: n }),
        };

        let ts: Vec<f64> = obs
            .iter()
            .map(|o| (o.date - first).num_days() as f64)
            .collect();
        let nf = n as f64;
        let mean_t = ts.iter().sum::<f64>() / nf;
        let mean_y = obs.iter().map(|o| o.value).sum::<f64>() / nf;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for (t, o) in ts.iter().zip(obs) {
            sxx += (t - mean_t).powi(2);
            sxy += (t - mean_t) * (o.value - mean_y);
        }
        // unique dates guarantee sxx > 0 once n >= 2
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_t;

        let residuals: Vec<f64> = ts
            .iter()
            .zip(obs)
            .map(|(t, o)| o.value - (intercept + slope * t))
            .collect();
        let mean_r = residuals.iter().sum::<f64>() / nf;
        let sigma = (residuals.iter().map(|r| (r - mean_r).powi(2)).sum::<f64>() / nf).sqrt();

        tracing::debug!(
            target: "forecast",
            points = n,
            slope,
            intercept,
            sigma,
            "linear trend fitted"
        );

        Ok(Box::new(LinearFit {
            first,
            last,
            offsets: ts,
            intercept,
            slope,
            sigma,
            z: z_for_width(self.interval_width),
        }))
    }

    fn name(&self) -> &'static str {
        "linear-trend"
    }
}

struct LinearFit {
    first: NaiveDate,
    last: NaiveDate,
    offsets: Vec<f64>,
    intercept: f64,
    slope: f64,
    sigma: f64,
    z: f64,
}

impl LinearFit {
    fn point(&self, date: NaiveDate, t: f64, half_width: f64) -> ForecastPoint {
        let estimate = self.intercept + self.slope * t;
        ForecastPoint {
            date,
            estimate,
            lower: estimate - half_width,
            upper: estimate + half_width,
        }
    }
}

impl FittedModel for LinearFit {
    fn predict(&self, periods: i64) -> Result<Vec<ForecastPoint>, ModelError> {
        if !(0..=MAX_HORIZON_DAYS).contains(&periods) {
            return Err(ModelError::InvalidHorizon(periods));
        }

        let n = self.offsets.len() as f64;
        let band = self.z * self.sigma;
        let mut out = Vec::with_capacity(self.offsets.len() + periods as usize);

        for &t in &self.offsets {
            let date = self
                .first
                .checked_add_days(Days::new(t as u64))
                .ok_or(ModelError::InvalidHorizon(periods))?;
            out.push(self.point(date, t, band));
        }

        let t_last = (self.last - self.first).num_days() as f64;
        for h in 1..=periods as u64 {
            let date = self
                .last
                .checked_add_days(Days::new(h))
                .ok_or(ModelError::InvalidHorizon(periods))?;
            let widen = (1.0 + h as f64 / n).sqrt();
            out.push(self.point(date, t_last + h as f64, band * widen));
        }
        Ok(out)
    }
}
