//! Chart rendering and output.
//!
//! Rasterization runs on the blocking pool; encoded PNGs are then handed to a
//! [`ChartSink`] one at a time.

use std::io::Cursor;

use clap::ValueEnum;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    CapacityError,
    config::AppConfig,
    model::{NonVideoFootprint, RateParameters, VideoFootprint},
    report::CapacityReport,
    sweep::{self, SweepSettings},
};

pub mod raster;
pub mod sink;

pub use sink::{ChartSink, MemorySink, PngDirectory};

/// Charts the CLI knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    /// Wait-time tail probability over trips/day and wait threshold.
    Heatmap,
    /// Utilization bars against daily trips with the rho = 1 line.
    Utilization,
    /// Heatmap and utilization bars side by side.
    Combined,
    /// Daily storage volumes on a log axis.
    Storage,
    /// Transfer times on a log axis.
    Transfer,
}

impl ChartKind {
    pub const DEFAULT_SET: [ChartKind; 3] =
        [ChartKind::Combined, ChartKind::Storage, ChartKind::Transfer];

    /// File stem used when the chart is written to disk.
    pub fn file_stem(self) -> &'static str {
        match self {
            ChartKind::Heatmap => "prob_heatmap",
            ChartKind::Utilization => "rho_hist",
            ChartKind::Combined => "combined_plot",
            ChartKind::Storage => "storage_sizes",
            ChartKind::Transfer => "transfer_times",
        }
    }

    fn needs_grid(self) -> bool {
        matches!(self, ChartKind::Heatmap | ChartKind::Combined)
    }
}

/// Pixel dimensions per chart.
pub fn dimensions(kind: ChartKind) -> (u32, u32) {
    match kind {
        ChartKind::Heatmap => (1000, 800),
        ChartKind::Utilization => (1000, 600),
        ChartKind::Combined => (1800, 800),
        ChartKind::Storage | ChartKind::Transfer => (900, 600),
    }
}

/// Inputs the renderers need, detached from the config so they can move
/// onto the blocking pool.
#[derive(Debug, Clone)]
struct RenderInputs {
    sweeps: SweepSettings,
    base: RateParameters,
    non_video: NonVideoFootprint,
    video: VideoFootprint,
}

/// Renders one chart to an in-memory image.
fn render(kind: ChartKind, inputs: &RenderInputs, grid: Option<&sweep::ProbabilityGrid>) -> RgbImage {
    let (width, height) = dimensions(kind);
    let mut image = raster::blank(width, height);
    let region = raster::Rect::of(&image);
    let series = || sweep::utilization_series(&inputs.base, &inputs.sweeps.utilization_trips);
    match kind {
        ChartKind::Heatmap => {
            if let Some(grid) = grid {
                raster::draw_heatmap(&mut image, region, grid);
            }
        }
        ChartKind::Utilization => {
            raster::draw_utilization_bars(&mut image, region, &series());
        }
        ChartKind::Combined => {
            let (left, right) = region.split_columns();
            if let Some(grid) = grid {
                raster::draw_heatmap(&mut image, left, grid);
            }
            raster::draw_utilization_bars(&mut image, right, &series());
        }
        ChartKind::Storage => {
            let values = [
                inputs.non_video.route_bytes_per_day,
                inputs.non_video.transaction_bytes_per_day,
                inputs.video.daily.average_bytes,
                inputs.video.daily.worst_case_bytes,
                inputs.video.daily.all_trips_worst_case_bytes,
            ];
            raster::draw_category_bars(&mut image, region, &values, true);
        }
        ChartKind::Transfer => {
            let t = &inputs.video.transfer;
            let values = [
                t.cellular_full_emergency_secs,
                t.cellular_cut_secs,
                t.station_worst_case_secs,
                t.station_average_secs,
            ];
            raster::draw_category_bars(&mut image, region, &values, true);
        }
    }
    image
}

/// PNG-encodes an RGB image.
pub fn encode_png(image: RgbImage) -> Result<Vec<u8>, CapacityError> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| CapacityError::Render(format!("png encoding failed: {err}")))?;
    Ok(bytes)
}

fn render_all(
    kinds: &[ChartKind],
    inputs: &RenderInputs,
) -> Result<Vec<(ChartKind, Vec<u8>)>, CapacityError> {
    let grid = kinds.iter().any(|k| k.needs_grid()).then(|| {
        sweep::probability_grid(
            &inputs.base,
            &inputs.sweeps.heatmap_trips,
            &inputs.sweeps.wait_minutes,
        )
    });

    let mut encoded = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let png = encode_png(render(kind, inputs, grid.as_ref()))?;
        encoded.push((kind, png));
    }
    Ok(encoded)
}

/// Renders the configured chart set and writes each chart to `sink`.
/// Returns the number of charts written.
#[instrument(skip_all, fields(charts = config.output.charts.len()))]
pub async fn render_charts<S>(
    config: &AppConfig,
    report: &CapacityReport,
    sink: &S,
) -> Result<usize, CapacityError>
where
    S: ChartSink + ?Sized,
{
    let mut kinds: Vec<ChartKind> = Vec::with_capacity(config.output.charts.len());
    for &kind in &config.output.charts {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    let inputs = RenderInputs {
        sweeps: config.sweeps,
        base: config.sweeps.base_parameters(&config.rates),
        non_video: report.non_video,
        video: report.video,
    };
    let rendered = tokio::task::spawn_blocking(move || render_all(&kinds, &inputs)).await??;

    let count = rendered.len();
    for (kind, png) in rendered {
        let bytes = png.len();
        sink.write(kind.file_stem(), png).await?;
        info!(chart = kind.file_stem(), bytes, "chart rendered");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_unique() {
        let kinds = [
            ChartKind::Heatmap,
            ChartKind::Utilization,
            ChartKind::Combined,
            ChartKind::Storage,
            ChartKind::Transfer,
        ];
        let mut stems: Vec<_> = kinds.iter().map(|k| k.file_stem()).collect();
        stems.sort_unstable();
        stems.dedup();
        assert_eq!(stems.len(), kinds.len());
    }

    #[test]
    fn encoded_png_decodes_with_same_size() {
        let png = encode_png(raster::blank(32, 16)).expect("encode");
        let decoded = image::load_from_memory(&png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }
}
