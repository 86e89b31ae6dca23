//! Arrival/service rate model and the wait-time tail heuristic.
//!
//! Demand is assumed to be spread uniformly across the active hours of a
//! day, and a bike becomes available again once per average trip. The
//! formulas are intentionally permissive: zero or negative inputs propagate
//! as IEEE results instead of being rejected. Use [`RateParameters::validate`]
//! at the boundary when inputs come from users.

use serde::{Deserialize, Serialize};

use crate::CapacityError;

/// Offset added to the wait threshold so the tail stays finite as `t -> 0`.
pub const WAIT_OFFSET_MINUTES: f64 = 0.01;

/// Demand and fleet assumptions feeding the rate model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateParameters {
    pub active_hours_per_day: f64,
    pub trips_per_day: f64,
    pub avg_trip_minutes: f64,
    pub fleet_size: f64,
}

impl Default for RateParameters {
    fn default() -> Self {
        Self {
            active_hours_per_day: 4.0,
            trips_per_day: 10_000.0,
            avg_trip_minutes: 30.0,
            fleet_size: 5_000.0,
        }
    }
}

impl RateParameters {
    /// Copy of these parameters with a different daily trip volume.
    pub fn with_trips(self, trips_per_day: f64) -> Self {
        Self {
            trips_per_day,
            ..self
        }
    }

    /// Copy of these parameters with a different fleet size.
    pub fn with_fleet(self, fleet_size: f64) -> Self {
        Self { fleet_size, ..self }
    }

    /// Rejects non-positive or non-finite inputs.
    pub fn validate(&self) -> Result<(), CapacityError> {
        let fields = [
            ("active_hours_per_day", self.active_hours_per_day),
            ("trips_per_day", self.trips_per_day),
            ("avg_trip_minutes", self.avg_trip_minutes),
            ("fleet_size", self.fleet_size),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CapacityError::InvalidParameter(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.active_hours_per_day > 24.0 {
            return Err(CapacityError::InvalidParameter(format!(
                "active_hours_per_day cannot exceed 24, got {}",
                self.active_hours_per_day
            )));
        }
        Ok(())
    }
}

/// Rates derived from [`RateParameters`], all per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateResult {
    /// Requests for a bike per minute (lambda).
    pub arrival_rate: f64,
    /// Availability events per bike per minute (mu).
    pub service_rate: f64,
    /// Aggregate demand over aggregate fleet capacity (rho).
    pub utilization: f64,
}

impl RateResult {
    /// True once demand meets or exceeds the fleet's service capacity.
    pub fn is_saturated(&self) -> bool {
        self.utilization >= 1.0
    }
}

/// Derives arrival rate, service rate and utilization.
pub fn compute_rates(params: &RateParameters) -> RateResult {
    let interarrival_minutes = 60.0 * params.active_hours_per_day / params.trips_per_day;
    let arrival_rate = 1.0 / interarrival_minutes;
    let service_rate = 1.0 / params.avg_trip_minutes;
    RateResult {
        arrival_rate,
        service_rate,
        utilization: arrival_rate / (service_rate * params.fleet_size),
    }
}

/// Heuristic probability of waiting more than `t` minutes at utilization `rho`.
///
/// This is `exp(-(t + 0.01) / rho)`. It is not a textbook queueing result and
/// is not clamped to `[0, 1]`.
pub fn prob_more_than_t(t: f64, utilization: f64) -> f64 {
    (-(t + WAIT_OFFSET_MINUTES) / utilization).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn default_scenario_matches_hand_calculation() {
        let result = compute_rates(&RateParameters::default());
        assert!(close(result.arrival_rate, 10_000.0 / 240.0, 1e-9));
        assert!(close(result.service_rate, 1.0 / 30.0, 1e-12));
        assert!(close(result.utilization, 0.25, 1e-12));
        assert!(!result.is_saturated());
    }

    #[test]
    fn tail_matches_exponential_form() {
        let p = prob_more_than_t(1.0, 0.25);
        assert!(close(p, (-4.04f64).exp(), 1e-12));
        assert!(close(p, 0.0176, 1e-4));
    }

    #[test]
    fn zero_fleet_propagates_infinity() {
        let result = compute_rates(&RateParameters::default().with_fleet(0.0));
        assert!(result.utilization.is_infinite());
    }

    #[test]
    fn validate_rejects_non_positive_fields() {
        let err = RateParameters::default()
            .with_trips(0.0)
            .validate()
            .expect_err("zero trips should fail");
        assert!(format!("{err}").contains("trips_per_day"));

        let params = RateParameters {
            active_hours_per_day: 30.0,
            ..RateParameters::default()
        };
        assert!(params.validate().is_err());
        assert!(RateParameters::default().validate().is_ok());
    }

    #[test]
    fn saturation_flips_at_unit_utilization() {
        // 4 active hours, 30 minute trips: 5000 bikes saturate at 40k trips/day.
        let at_capacity = compute_rates(&RateParameters::default().with_trips(40_000.0));
        assert!(close(at_capacity.utilization, 1.0, 1e-12));
        assert!(
            compute_rates(&RateParameters::default().with_trips(40_001.0)).is_saturated()
        );
    }
}
