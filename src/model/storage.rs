//! Storage and bandwidth sizing for records and on-bike camera footage.
//!
//! Every size is expressed in bytes and every rate in bytes per second.
//! Conversion to MiB/GiB only happens in [`crate::report`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::CapacityError;

use super::{MIB, bits_to_bytes};

/// How the short emergency clip pushed over cellular is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmergencyCutMode {
    /// Clip recorded at the camera's full frame rate.
    #[default]
    FullRate,
    /// Clip down-sampled to a third of the camera's frame rate.
    ReducedRate,
}

impl EmergencyCutMode {
    fn frames_per_second(self, frame_rate: f64) -> f64 {
        match self {
            EmergencyCutMode::FullRate => frame_rate,
            EmergencyCutMode::ReducedRate => frame_rate / 3.0,
        }
    }
}

/// Operational assumptions for the storage model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageAssumptions {
    pub trips_per_day: f64,
    pub avg_trip_minutes: f64,
    pub fleet_size: f64,
    pub registered_users: f64,
    pub user_entry_bits: f64,
    pub bike_entry_bits: f64,
    pub route_sample_interval_secs: f64,
    pub route_coordinates_per_sample: f64,
    pub route_coordinate_bits: f64,
    pub transaction_fields: f64,
    pub transaction_field_bits: f64,
    /// Share of trips taken on a camera-equipped bike.
    pub camera_fraction: f64,
    pub frame_rate: f64,
    pub frame_size_bytes: f64,
    pub emergency_recording_minutes: f64,
    pub emergency_cut_minutes: f64,
    pub emergency_cut_mode: EmergencyCutMode,
    /// Bike-to-backend cellular uplink.
    pub cellular_rate_bytes_per_sec: f64,
    /// Docking station to central facility link.
    pub station_link_rate_bytes_per_sec: f64,
}

impl Default for StorageAssumptions {
    fn default() -> Self {
        Self {
            trips_per_day: 10_000.0,
            avg_trip_minutes: 30.0,
            fleet_size: 5_000.0,
            registered_users: 50_000.0,
            user_entry_bits: 320.0,
            bike_entry_bits: 640.0,
            route_sample_interval_secs: 10.0,
            route_coordinates_per_sample: 2.0,
            route_coordinate_bits: 32.0,
            transaction_fields: 10.0,
            transaction_field_bits: 32.0,
            camera_fraction: 0.1,
            frame_rate: 30.0,
            frame_size_bytes: 1.5 * MIB,
            emergency_recording_minutes: 15.0,
            emergency_cut_minutes: 2.0,
            emergency_cut_mode: EmergencyCutMode::FullRate,
            cellular_rate_bytes_per_sec: 25.0 * MIB,
            station_link_rate_bytes_per_sec: 1024.0 * MIB,
        }
    }
}

impl StorageAssumptions {
    /// Number of trips recorded by a camera each day.
    pub fn videos_recorded_per_day(&self) -> f64 {
        self.trips_per_day * self.camera_fraction
    }

    /// Rejects assumptions that would make the sizing meaningless.
    pub fn validate(&self) -> Result<(), CapacityError> {
        let non_negative = [
            ("trips_per_day", self.trips_per_day),
            ("avg_trip_minutes", self.avg_trip_minutes),
            ("fleet_size", self.fleet_size),
            ("registered_users", self.registered_users),
            ("user_entry_bits", self.user_entry_bits),
            ("bike_entry_bits", self.bike_entry_bits),
            ("route_coordinates_per_sample", self.route_coordinates_per_sample),
            ("route_coordinate_bits", self.route_coordinate_bits),
            ("transaction_fields", self.transaction_fields),
            ("transaction_field_bits", self.transaction_field_bits),
            ("frame_size_bytes", self.frame_size_bytes),
            ("emergency_recording_minutes", self.emergency_recording_minutes),
            ("emergency_cut_minutes", self.emergency_cut_minutes),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(CapacityError::InvalidParameter(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let positive = [
            ("route_sample_interval_secs", self.route_sample_interval_secs),
            ("frame_rate", self.frame_rate),
            ("cellular_rate_bytes_per_sec", self.cellular_rate_bytes_per_sec),
            (
                "station_link_rate_bytes_per_sec",
                self.station_link_rate_bytes_per_sec,
            ),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CapacityError::InvalidParameter(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.camera_fraction) {
            return Err(CapacityError::InvalidParameter(format!(
                "camera_fraction must lie in [0, 1], got {}",
                self.camera_fraction
            )));
        }
        Ok(())
    }

    fn footage_bytes(&self, minutes: f64, frames_per_second: f64) -> f64 {
        minutes * 60.0 * frames_per_second * self.frame_size_bytes
    }
}

/// Record sizes and daily write volumes outside of video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NonVideoFootprint {
    pub user_entry_bytes: f64,
    pub bike_entry_bytes: f64,
    pub users_table_bytes: f64,
    pub bikes_table_bytes: f64,
    pub route_bytes_per_day: f64,
    pub transaction_bytes_per_day: f64,
}

/// Footage size of a single recorded trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerVideoSizes {
    pub average_bytes: f64,
    pub emergency_bytes: f64,
    pub worst_case_bytes: f64,
    pub emergency_cut_bytes: f64,
}

/// Fleet-wide footage written per day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyVideoSizes {
    /// Every trip recorded with an emergency, regardless of camera coverage.
    pub all_trips_worst_case_bytes: f64,
    pub worst_case_bytes: f64,
    pub average_bytes: f64,
}

/// Transfer durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransferTimes {
    pub cellular_full_emergency_secs: f64,
    pub cellular_cut_secs: f64,
    pub station_worst_case_secs: f64,
    pub station_average_secs: f64,
}

/// Everything derived from the camera assumptions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoFootprint {
    pub per_video: PerVideoSizes,
    pub daily: DailyVideoSizes,
    pub transfer: TransferTimes,
}

/// Entry sizes and daily route/transaction log volumes.
pub fn calc_non_video_memory(assumptions: &StorageAssumptions) -> NonVideoFootprint {
    let user_entry_bytes = bits_to_bytes(assumptions.user_entry_bits);
    let bike_entry_bytes = bits_to_bytes(assumptions.bike_entry_bits);

    let samples_per_trip = assumptions.avg_trip_minutes * 60.0 / assumptions.route_sample_interval_secs;
    let route_bytes_per_trip = samples_per_trip
        * bits_to_bytes(assumptions.route_coordinates_per_sample * assumptions.route_coordinate_bits);
    let transaction_bytes_per_trip =
        bits_to_bytes(assumptions.transaction_fields * assumptions.transaction_field_bits);

    NonVideoFootprint {
        user_entry_bytes,
        bike_entry_bytes,
        users_table_bytes: user_entry_bytes * assumptions.registered_users,
        bikes_table_bytes: bike_entry_bytes * assumptions.fleet_size,
        route_bytes_per_day: route_bytes_per_trip * assumptions.trips_per_day,
        transaction_bytes_per_day: transaction_bytes_per_trip * assumptions.trips_per_day,
    }
}

/// Per-video sizes, daily aggregates and transfer times for camera footage.
pub fn calc_video_info(assumptions: &StorageAssumptions) -> VideoFootprint {
    let fps = assumptions.frame_rate;
    let average_bytes = assumptions.footage_bytes(assumptions.avg_trip_minutes, fps);
    let emergency_bytes = assumptions.footage_bytes(assumptions.emergency_recording_minutes, fps);
    let emergency_cut_bytes = assumptions.footage_bytes(
        assumptions.emergency_cut_minutes,
        assumptions.emergency_cut_mode.frames_per_second(fps),
    );
    let per_video = PerVideoSizes {
        average_bytes,
        emergency_bytes,
        worst_case_bytes: average_bytes + emergency_bytes,
        emergency_cut_bytes,
    };

    let videos = assumptions.videos_recorded_per_day();
    let daily = DailyVideoSizes {
        all_trips_worst_case_bytes: per_video.worst_case_bytes * assumptions.trips_per_day,
        worst_case_bytes: per_video.worst_case_bytes * videos,
        average_bytes: per_video.average_bytes * videos,
    };

    let cellular = assumptions.cellular_rate_bytes_per_sec;
    let station = assumptions.station_link_rate_bytes_per_sec;
    let transfer = TransferTimes {
        cellular_full_emergency_secs: per_video.emergency_bytes / cellular,
        cellular_cut_secs: per_video.emergency_cut_bytes / cellular,
        station_worst_case_secs: daily.worst_case_bytes / station,
        station_average_secs: daily.average_bytes / station,
    };

    VideoFootprint {
        per_video,
        daily,
        transfer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_sizes_follow_bit_widths() {
        let footprint = calc_non_video_memory(&StorageAssumptions::default());
        assert_eq!(footprint.user_entry_bytes, 40.0);
        assert_eq!(footprint.bike_entry_bytes, 80.0);
        assert_eq!(footprint.users_table_bytes, 2_000_000.0);
        assert_eq!(footprint.bikes_table_bytes, 400_000.0);
    }

    #[test]
    fn daily_logs_scale_with_trips() {
        let footprint = calc_non_video_memory(&StorageAssumptions::default());
        // 180 samples of two 4-byte coordinates per trip.
        assert_eq!(footprint.route_bytes_per_day, 180.0 * 8.0 * 10_000.0);
        assert_eq!(footprint.transaction_bytes_per_day, 40.0 * 10_000.0);
    }

    #[test]
    fn cellular_times_use_bytes_per_second() {
        let info = calc_video_info(&StorageAssumptions::default());
        // 15 min * 60 s * 30 fps * 1.5 MiB over 25 MiB/s.
        assert!((info.transfer.cellular_full_emergency_secs - 1620.0).abs() < 1e-9);
        // 2 min clip at full rate.
        assert!((info.transfer.cellular_cut_secs - 216.0).abs() < 1e-9);
    }

    #[test]
    fn reduced_rate_cut_is_a_third_of_full_rate() {
        let full = calc_video_info(&StorageAssumptions::default());
        let reduced = calc_video_info(&StorageAssumptions {
            emergency_cut_mode: EmergencyCutMode::ReducedRate,
            ..StorageAssumptions::default()
        });
        let ratio = reduced.per_video.emergency_cut_bytes / full.per_video.emergency_cut_bytes;
        assert!((ratio - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(reduced.per_video.worst_case_bytes, full.per_video.worst_case_bytes);
    }

    #[test]
    fn validate_rejects_fraction_above_one() {
        let assumptions = StorageAssumptions {
            camera_fraction: 1.5,
            ..StorageAssumptions::default()
        };
        let err = assumptions.validate().expect_err("fraction above one");
        assert!(format!("{err}").contains("camera_fraction"));
        assert!(StorageAssumptions::default().validate().is_ok());
    }
}
