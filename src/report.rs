//! Human-readable and JSON summaries of the computed estimates.

use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{
    CapacityError,
    model::{
        GIB, KIB, MIB, NonVideoFootprint, RateParameters, RateResult, StorageAssumptions, TIB,
        VideoFootprint, calc_non_video_memory, calc_video_info, compute_rates, prob_more_than_t,
    },
};

/// Output encoding for the printed report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything a single run computes, in raw units (bytes, seconds, per minute).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityReport {
    pub parameters: RateParameters,
    pub rates: RateResult,
    pub wait_threshold_minutes: f64,
    pub prob_wait_exceeds_threshold: f64,
    pub non_video: NonVideoFootprint,
    pub video: VideoFootprint,
}

impl CapacityReport {
    pub fn build(
        parameters: &RateParameters,
        storage: &StorageAssumptions,
        wait_threshold_minutes: f64,
    ) -> Self {
        let rates = compute_rates(parameters);
        Self {
            parameters: *parameters,
            rates,
            wait_threshold_minutes,
            prob_wait_exceeds_threshold: prob_more_than_t(wait_threshold_minutes, rates.utilization),
            non_video: calc_non_video_memory(storage),
            video: calc_video_info(storage),
        }
    }

    pub fn write_to<W: Write>(&self, out: &mut W, format: OutputFormat) -> Result<(), CapacityError> {
        match format {
            OutputFormat::Text => out.write_all(self.to_text().as_bytes())?,
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, self)
                    .map_err(|err| CapacityError::Io(format!("failed to encode report: {err}")))?;
                writeln!(out)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_text(&self) -> String {
        let r = &self.rates;
        let nv = &self.non_video;
        let pv = &self.video.per_video;
        let daily = &self.video.daily;
        let t = &self.video.transfer;
        let saturated = if r.is_saturated() { " (saturated)" } else { "" };

        let mut lines = vec![
            "rate model".to_string(),
            row("arrival rate", format!("{:.4} /min", r.arrival_rate)),
            row("service rate", format!("{:.4} /min", r.service_rate)),
            row("utilization", format!("{:.4}{saturated}", r.utilization)),
            row(
                &format!("P(wait > {} min)", self.wait_threshold_minutes),
                format!("{:.4}", self.prob_wait_exceeds_threshold),
            ),
            "records".to_string(),
            row("user entry", format_bytes(nv.user_entry_bytes)),
            row("bike entry", format_bytes(nv.bike_entry_bytes)),
            row("users table", format_bytes(nv.users_table_bytes)),
            row("bikes table", format_bytes(nv.bikes_table_bytes)),
            row("routes per day", format_bytes(nv.route_bytes_per_day)),
            row("transactions per day", format_bytes(nv.transaction_bytes_per_day)),
            "video per trip".to_string(),
            row("average", format_bytes(pv.average_bytes)),
            row("emergency", format_bytes(pv.emergency_bytes)),
            row("worst case", format_bytes(pv.worst_case_bytes)),
            row("emergency cut", format_bytes(pv.emergency_cut_bytes)),
            "video per day".to_string(),
            row("all trips, worst case", format_bytes(daily.all_trips_worst_case_bytes)),
            row("worst case", format_bytes(daily.worst_case_bytes)),
            row("average", format_bytes(daily.average_bytes)),
            "transfer times".to_string(),
            row("cellular, full emergency", format_seconds(t.cellular_full_emergency_secs)),
            row("cellular, emergency cut", format_seconds(t.cellular_cut_secs)),
            row("station link, worst case", format_seconds(t.station_worst_case_secs)),
            row("station link, average", format_seconds(t.station_average_secs)),
        ];
        lines.push(String::new());
        lines.join("\n")
    }
}

fn row(label: &str, value: String) -> String {
    format!("  {label:<26}{value}")
}

/// Formats a byte count with binary prefixes.
pub fn format_bytes(bytes: f64) -> String {
    let units = [(TIB, "TiB"), (GIB, "GiB"), (MIB, "MiB"), (KIB, "KiB")];
    for (size, unit) in units {
        if bytes.abs() >= size {
            return format!("{:.2} {unit}", bytes / size);
        }
    }
    format!("{bytes:.0} B")
}

/// Formats seconds, adding minutes or hours once they read better.
pub fn format_seconds(secs: f64) -> String {
    if secs >= 3600.0 {
        format!("{secs:.1} s ({:.2} h)", secs / 3600.0)
    } else if secs >= 60.0 {
        format!("{secs:.1} s ({:.1} min)", secs / 60.0)
    } else {
        format!("{secs:.2} s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_pick_largest_unit() {
        assert_eq!(format_bytes(40.0), "40 B");
        assert_eq!(format_bytes(1.5 * MIB), "1.50 MiB");
        assert_eq!(format_bytes(3.0 * TIB), "3.00 TiB");
    }

    #[test]
    fn seconds_add_minutes_and_hours() {
        assert_eq!(format_seconds(12.5), "12.50 s");
        assert_eq!(format_seconds(216.0), "216.0 s (3.6 min)");
        assert_eq!(format_seconds(7200.0), "7200.0 s (2.00 h)");
    }

    #[test]
    fn text_report_mentions_each_section() {
        let report = CapacityReport::build(
            &RateParameters::default(),
            &StorageAssumptions::default(),
            1.0,
        );
        let text = report.to_text();
        for section in ["rate model", "records", "video per trip", "video per day", "transfer times"] {
            assert!(text.contains(section), "missing {section}");
        }
        assert!(text.contains("40 B"));
        assert!(!text.contains("saturated"));
    }
}
