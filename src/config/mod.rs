pub mod forecast;

pub use forecast::{ForecastConfig, TrendsConfig};
