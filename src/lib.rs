//! Core library for the bikecap capacity planner.
//!
//! The crate exposes the closed-form rate and storage models, parameter
//! sweeps over the rate model, raster chart rendering, and the orchestration
//! entry point used by the CLI application.

pub mod chart;
pub mod config;
pub mod model;
pub mod report;
pub mod sweep;

use std::io::Write;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::chart::{ChartSink, PngDirectory};

/// Errors surfaced by the calculators, the config loader and the chart writers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("I/O failure: {0}")]
    Io(String),
    #[error("render failure: {0}")]
    Render(String),
    #[error("task join failure: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for CapacityError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

impl From<std::io::Error> for CapacityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Computes every estimate, prints the report and writes the configured charts
/// into the output directory.
#[instrument(skip_all)]
pub async fn run(config: config::AppConfig) -> Result<report::CapacityReport, CapacityError> {
    let sink = PngDirectory::new(config.output.dir.clone());
    let mut stdout = std::io::stdout();
    run_with_sink(&config, &sink, &mut stdout).await
}

/// Same as [`run`] with an explicit chart sink and report writer.
#[instrument(skip_all)]
pub async fn run_with_sink<S, W>(
    config: &config::AppConfig,
    sink: &S,
    out: &mut W,
) -> Result<report::CapacityReport, CapacityError>
where
    S: ChartSink + ?Sized,
    W: Write,
{
    let report = report::CapacityReport::build(
        &config.rates,
        &config.storage,
        config.output.wait_threshold_minutes,
    );
    info!(
        arrival_rate = report.rates.arrival_rate,
        service_rate = report.rates.service_rate,
        utilization = report.rates.utilization,
        "rate model evaluated"
    );
    if report.rates.is_saturated() {
        warn!(
            utilization = report.rates.utilization,
            "fleet is saturated at the configured demand"
        );
    }

    report.write_to(out, config.output.format)?;

    if config.output.charts.is_empty() {
        info!("chart rendering disabled");
        return Ok(report);
    }

    let written = chart::render_charts(config, &report, sink).await?;
    info!(count = written, "charts written");
    Ok(report)
}
