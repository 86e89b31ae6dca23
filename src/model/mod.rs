//! Closed-form capacity models.

pub mod rates;
pub mod storage;

pub use rates::{RateParameters, RateResult, compute_rates, prob_more_than_t};
pub use storage::{
    EmergencyCutMode, NonVideoFootprint, StorageAssumptions, VideoFootprint, calc_non_video_memory,
    calc_video_info,
};

/// Bytes in a kibibyte.
pub const KIB: f64 = 1024.0;
/// Bytes in a mebibyte.
pub const MIB: f64 = KIB * 1024.0;
/// Bytes in a gibibyte.
pub const GIB: f64 = MIB * 1024.0;
/// Bytes in a tebibyte.
pub const TIB: f64 = GIB * 1024.0;

/// Converts a bit width into whole-or-fractional bytes.
pub fn bits_to_bytes(bits: f64) -> f64 {
    bits / 8.0
}
