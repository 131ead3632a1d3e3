//! Run one forecast through the pipeline and print the JSON payload.
//!
//! Usage: `forecast_once <keyword> [periods]`
//! Honors the same config/env as the server (`TRENDS_TEST_MODE=mock` for offline runs).

use std::sync::Arc;

use trend_forecaster::config::ForecastConfig;
use trend_forecaster::source::build_source_from_config;
use trend_forecaster::ForecastPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let keyword = args.next().unwrap_or_else(|| "Outsystems".to_string());
    let cfg = ForecastConfig::load_default()?;
    let periods = match args.next() {
        Some(p) => p.parse::<i64>()?,
        None => cfg.default_periods,
    };

    let source = build_source_from_config(&cfg)?;
    let pipeline = Arc::new(ForecastPipeline::from_config(&cfg, source));

    let (outcome, cache) = pipeline.run(&keyword, periods).await;
    tracing::info!(outcome = outcome.label(), cache = cache.as_str(), "forecast-once done");
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
