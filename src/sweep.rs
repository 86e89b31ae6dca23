//! Parameter sweeps over the rate model feeding the charts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    CapacityError,
    model::{RateParameters, compute_rates, prob_more_than_t},
};

/// Upper bound on the samples a single sweep range may produce.
pub const MAX_SWEEP_SAMPLES: usize = 1_000_000;
/// Upper bound on the cells of the wait-threshold by trips/day grid.
pub const MAX_GRID_CELLS: usize = 10_000_000;

/// Half-open arithmetic range `[start, stop)` advanced by `step`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl SweepRange {
    pub const fn new(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// Uncapped sample count, `None` when the range is empty or not finite.
    fn sample_count(&self) -> Option<f64> {
        let span = self.stop - self.start;
        let usable = self.step.is_finite() && span.is_finite() && self.step > 0.0 && span > 0.0;
        usable.then(|| (span / self.step).ceil())
    }

    /// Number of samples produced by [`SweepRange::values`], at most
    /// [`MAX_SWEEP_SAMPLES`].
    pub fn len(&self) -> usize {
        match self.sample_count() {
            Some(count) if count <= MAX_SWEEP_SAMPLES as f64 => count as usize,
            Some(_) => MAX_SWEEP_SAMPLES,
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples computed as `start + i * step` to avoid accumulated drift.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }

    /// Last sample, if any.
    pub fn last(&self) -> Option<f64> {
        self.len()
            .checked_sub(1)
            .map(|i| self.start + i as f64 * self.step)
    }

    pub fn validate(&self, name: &str) -> Result<(), CapacityError> {
        if !(self.start.is_finite() && self.stop.is_finite() && self.step.is_finite()) {
            return Err(CapacityError::Config(format!(
                "sweep range {name} must be finite (start={}, stop={}, step={})",
                self.start, self.stop, self.step
            )));
        }
        match self.sample_count() {
            None => Err(CapacityError::Config(format!(
                "sweep range {name} is empty (start={}, stop={}, step={})",
                self.start, self.stop, self.step
            ))),
            Some(count) if count > MAX_SWEEP_SAMPLES as f64 => Err(CapacityError::Config(format!(
                "sweep range {name} has {count} samples, limit is {MAX_SWEEP_SAMPLES}"
            ))),
            Some(_) => Ok(()),
        }
    }
}

/// Sweep extents used by the charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepSettings {
    /// Active hours assumed by the sweeps, independent of the report scenario.
    pub active_hours_per_day: f64,
    pub heatmap_trips: SweepRange,
    pub wait_minutes: SweepRange,
    pub utilization_trips: SweepRange,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            active_hours_per_day: 8.0,
            heatmap_trips: SweepRange::new(1.0, 1_000_000.0, 100.0),
            wait_minutes: SweepRange::new(1.0, 10.5, 0.1),
            utilization_trips: SweepRange::new(100.0, 100_000.0, 5_000.0),
        }
    }
}

impl SweepSettings {
    pub fn validate(&self) -> Result<(), CapacityError> {
        self.heatmap_trips.validate("heatmap_trips")?;
        self.wait_minutes.validate("wait_minutes")?;
        self.utilization_trips.validate("utilization_trips")?;
        let cells = self.heatmap_trips.len() * self.wait_minutes.len();
        if cells > MAX_GRID_CELLS {
            return Err(CapacityError::Config(format!(
                "probability grid has {cells} cells, limit is {MAX_GRID_CELLS}"
            )));
        }
        Ok(())
    }

    /// Rate parameters the sweeps vary trips/day around.
    pub fn base_parameters(&self, scenario: &RateParameters) -> RateParameters {
        RateParameters {
            active_hours_per_day: self.active_hours_per_day,
            ..*scenario
        }
    }
}

/// Tail probabilities indexed by wait threshold (rows) and trips/day (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityGrid {
    pub trips: Vec<f64>,
    pub waits: Vec<f64>,
    /// Row-major, `waits.len() * trips.len()` cells.
    pub values: Vec<f64>,
}

impl ProbabilityGrid {
    pub fn rows(&self) -> usize {
        self.waits.len()
    }

    pub fn cols(&self) -> usize {
        self.trips.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        self.values.get(row * self.cols() + col).copied()
    }

    /// Smallest and largest finite cell.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Evaluates the wait-time tail over a trips/day by wait-threshold grid.
pub fn probability_grid(
    base: &RateParameters,
    trips: &SweepRange,
    waits: &SweepRange,
) -> ProbabilityGrid {
    let trips = trips.values();
    let waits = waits.values();
    let utilizations: Vec<f64> = trips
        .iter()
        .map(|&n| compute_rates(&base.with_trips(n)).utilization)
        .collect();

    let mut values = Vec::with_capacity(trips.len() * waits.len());
    for &wait in &waits {
        values.extend(utilizations.iter().map(|&rho| prob_more_than_t(wait, rho)));
    }
    debug!(rows = waits.len(), cols = trips.len(), "probability grid evaluated");

    ProbabilityGrid {
        trips,
        waits,
        values,
    }
}

/// Utilization for each trips/day sample.
pub fn utilization_series(base: &RateParameters, trips: &SweepRange) -> Vec<(f64, f64)> {
    trips
        .values()
        .into_iter()
        .map(|n| (n, compute_rates(&base.with_trips(n)).utilization))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_half_open() {
        let range = SweepRange::new(100.0, 100_000.0, 5_000.0);
        let values = range.values();
        assert_eq!(values.len(), 20);
        assert_eq!(values[0], 100.0);
        assert_eq!(range.last(), Some(95_100.0));
    }

    #[test]
    fn fractional_step_matches_arange_length() {
        assert_eq!(SweepRange::new(1.0, 10.5, 0.1).len(), 95);
    }

    #[test]
    fn degenerate_ranges_are_empty() {
        assert!(SweepRange::new(5.0, 1.0, 1.0).is_empty());
        assert!(SweepRange::new(0.0, 1.0, 0.0).is_empty());
        assert!(SweepRange::new(0.0, 1.0, f64::NAN).is_empty());
        assert!(SweepRange::new(0.0, 0.0, 1.0).validate("x").is_err());
    }

    #[test]
    fn unbounded_ranges_are_capped_and_rejected() {
        let infinite = SweepRange::new(100.0, f64::INFINITY, 5_000.0);
        assert_eq!(infinite.len(), 0);
        let err = infinite.validate("utilization_trips").expect_err("infinite stop");
        assert!(format!("{err}").contains("finite"));

        let huge = SweepRange::new(0.0, 1.0e15, 1.0);
        assert_eq!(huge.len(), MAX_SWEEP_SAMPLES);
        let err = huge.validate("heatmap_trips").expect_err("too many samples");
        assert!(format!("{err}").contains("limit"));
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let settings = SweepSettings {
            heatmap_trips: SweepRange::new(0.0, 1_000_000.0, 1.0),
            wait_minutes: SweepRange::new(0.0, 100.0, 1.0),
            ..SweepSettings::default()
        };
        assert!(settings.validate().is_err());
        assert!(SweepSettings::default().validate().is_ok());
    }

    #[test]
    fn grid_cells_follow_the_tail() {
        let base = RateParameters::default();
        let grid = probability_grid(
            &base,
            &SweepRange::new(1_000.0, 3_000.0, 1_000.0),
            &SweepRange::new(1.0, 4.0, 1.0),
        );
        assert_eq!((grid.rows(), grid.cols()), (3, 2));
        let rho = compute_rates(&base.with_trips(2_000.0)).utilization;
        assert_eq!(grid.get(2, 1), Some(prob_more_than_t(3.0, rho)));
        assert_eq!(grid.get(3, 0), None);
    }
}
