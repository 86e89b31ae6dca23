//! Configuration loading and validation utilities.

use std::{io::ErrorKind, path::PathBuf};

use clap::Parser;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, instrument};

use crate::{
    CapacityError,
    chart::ChartKind,
    model::{EmergencyCutMode, RateParameters, StorageAssumptions},
    report::OutputFormat,
    sweep::SweepSettings,
};

/// Document read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_PATH: &str = "capacity.toml";

/// Command-line arguments used to bootstrap a run.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    author,
    version,
    about = "Closed-form capacity estimates for a bike-sharing fleet"
)]
pub struct CliArgs {
    /// Location of the assumptions document.
    #[arg(long, value_name = "PATH", env = "BIKECAP_CONFIG")]
    pub config: Option<PathBuf>,
    /// Directory receiving the rendered charts.
    #[arg(long, value_name = "DIR", env = "BIKECAP_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    /// Report encoding printed to stdout.
    #[arg(long, value_enum, env = "BIKECAP_FORMAT")]
    pub format: Option<OutputFormat>,
    /// Charts to render, comma separated.
    #[arg(long = "chart", value_enum, value_delimiter = ',')]
    pub charts: Vec<ChartKind>,
    /// Skip chart rendering entirely.
    #[arg(long, conflicts_with = "charts")]
    pub no_charts: bool,
    /// Hours per day during which trips are requested.
    #[arg(long, value_name = "HOURS", env = "BIKECAP_ACTIVE_HOURS")]
    pub active_hours: Option<f64>,
    /// Trips per day, shared by the rate and storage models.
    #[arg(long, value_name = "TRIPS", env = "BIKECAP_TRIPS_PER_DAY")]
    pub trips_per_day: Option<f64>,
    /// Average trip duration, shared by the rate and storage models.
    #[arg(long, value_name = "MINUTES", env = "BIKECAP_AVG_TRIP_MINUTES")]
    pub avg_trip_minutes: Option<f64>,
    /// Number of bikes in the fleet.
    #[arg(long, value_name = "BIKES", env = "BIKECAP_FLEET_SIZE")]
    pub fleet_size: Option<f64>,
    /// Share of trips on camera-equipped bikes.
    #[arg(long, value_name = "FRACTION", env = "BIKECAP_CAMERA_FRACTION")]
    pub camera_fraction: Option<f64>,
    /// Sizing rule for the emergency clip sent over cellular.
    #[arg(long, value_enum, env = "BIKECAP_EMERGENCY_CUT_MODE")]
    pub emergency_cut_mode: Option<EmergencyCutMode>,
    /// Wait threshold reported alongside the rates.
    #[arg(long, value_name = "MINUTES")]
    pub wait_threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
struct OutputDocument {
    dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    charts: Option<Vec<ChartKind>>,
    wait_threshold_minutes: Option<f64>,
}

/// Parsed assumptions document; every section and field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityDocument {
    rates: RateParameters,
    storage: StorageAssumptions,
    sweeps: SweepSettings,
    output: OutputDocument,
}

impl CapacityDocument {
    pub fn parse(raw: &str) -> Result<Self, CapacityError> {
        toml::from_str(raw)
            .map_err(|err| CapacityError::Config(format!("invalid capacity document: {err}")))
    }
}

/// Where and how results are emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub format: OutputFormat,
    pub charts: Vec<ChartKind>,
    pub wait_threshold_minutes: f64,
}

/// Fully merged configuration set.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub cli: CliArgs,
    pub rates: RateParameters,
    pub storage: StorageAssumptions,
    pub sweeps: SweepSettings,
    pub output: OutputSettings,
}

impl AppConfig {
    /// Reads the assumptions document and merges CLI overrides on top.
    #[instrument(skip_all)]
    pub async fn load(cli: CliArgs) -> Result<Self, CapacityError> {
        let explicit = cli.config.is_some();
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let document = match fs::read_to_string(&path).await {
            Ok(raw) => CapacityDocument::parse(&raw)?,
            Err(err) if !explicit && err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no capacity document, using defaults");
                CapacityDocument::default()
            }
            Err(err) => {
                return Err(CapacityError::Config(format!(
                    "failed to read {}: {err}",
                    path.display()
                )));
            }
        };

        Self::from_document(cli, document)
    }

    /// Applies CLI overrides to a parsed document and validates the result.
    pub fn from_document(cli: CliArgs, document: CapacityDocument) -> Result<Self, CapacityError> {
        let CapacityDocument {
            mut rates,
            mut storage,
            sweeps,
            output,
        } = document;

        if let Some(hours) = cli.active_hours {
            rates.active_hours_per_day = hours;
        }
        if let Some(trips) = cli.trips_per_day {
            rates.trips_per_day = trips;
            storage.trips_per_day = trips;
        }
        if let Some(minutes) = cli.avg_trip_minutes {
            rates.avg_trip_minutes = minutes;
            storage.avg_trip_minutes = minutes;
        }
        if let Some(fleet) = cli.fleet_size {
            rates.fleet_size = fleet;
            storage.fleet_size = fleet;
        }
        if let Some(fraction) = cli.camera_fraction {
            storage.camera_fraction = fraction;
        }
        if let Some(mode) = cli.emergency_cut_mode {
            storage.emergency_cut_mode = mode;
        }

        let charts = if cli.no_charts {
            Vec::new()
        } else if !cli.charts.is_empty() {
            cli.charts.clone()
        } else {
            output
                .charts
                .unwrap_or_else(|| ChartKind::DEFAULT_SET.to_vec())
        };
        let wait_threshold_minutes = cli
            .wait_threshold
            .or(output.wait_threshold_minutes)
            .unwrap_or(1.0);
        if !wait_threshold_minutes.is_finite() || wait_threshold_minutes < 0.0 {
            return Err(CapacityError::InvalidParameter(format!(
                "wait threshold must be a non-negative number, got {wait_threshold_minutes}"
            )));
        }

        rates.validate()?;
        storage.validate()?;
        sweeps.validate()?;
        sweeps.base_parameters(&rates).validate()?;

        let output = OutputSettings {
            dir: cli
                .output_dir
                .clone()
                .or(output.dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            format: cli.format.or(output.format).unwrap_or_default(),
            charts,
            wait_threshold_minutes,
        };

        Ok(Self {
            cli,
            rates,
            storage,
            sweeps,
            output,
        })
    }
}
