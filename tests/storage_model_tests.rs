use bikecap::model::{
    EmergencyCutMode, MIB, StorageAssumptions, calc_non_video_memory, calc_video_info,
};

#[test]
fn user_entry_is_forty_bytes() {
    let footprint = calc_non_video_memory(&StorageAssumptions::default());
    assert_eq!(footprint.user_entry_bytes, 40.0);

    let busier = StorageAssumptions {
        trips_per_day: 1.0e6,
        fleet_size: 1.0,
        ..StorageAssumptions::default()
    };
    assert_eq!(calc_non_video_memory(&busier).user_entry_bytes, 40.0);
}

#[test]
fn worst_case_is_average_plus_emergency() {
    for minutes in [5.0, 30.0, 47.5] {
        let assumptions = StorageAssumptions {
            avg_trip_minutes: minutes,
            ..StorageAssumptions::default()
        };
        let per_video = calc_video_info(&assumptions).per_video;
        assert_eq!(
            per_video.worst_case_bytes,
            per_video.average_bytes + per_video.emergency_bytes
        );
    }
}

#[test]
fn daily_worst_case_scales_with_recorded_videos() {
    let assumptions = StorageAssumptions::default();
    let info = calc_video_info(&assumptions);
    let videos = assumptions.trips_per_day * assumptions.camera_fraction;
    assert_eq!(info.daily.worst_case_bytes, info.per_video.worst_case_bytes * videos);
    assert_eq!(
        info.daily.all_trips_worst_case_bytes,
        info.per_video.worst_case_bytes * assumptions.trips_per_day
    );
    assert_eq!(info.daily.average_bytes, info.per_video.average_bytes * videos);
}

#[test]
fn default_footage_sizes() {
    let info = calc_video_info(&StorageAssumptions::default());
    // 30 min at 30 fps with 1.5 MiB frames.
    assert_eq!(info.per_video.average_bytes, 81_000.0 * MIB);
    assert_eq!(info.per_video.emergency_bytes, 40_500.0 * MIB);
    assert_eq!(info.per_video.emergency_cut_bytes, 5_400.0 * MIB);
}

#[test]
fn station_link_times_stay_in_seconds() {
    let assumptions = StorageAssumptions::default();
    let info = calc_video_info(&assumptions);
    let expected = info.daily.worst_case_bytes / assumptions.station_link_rate_bytes_per_sec;
    assert_eq!(info.transfer.station_worst_case_secs, expected);
    // 1000 videos of 121 500 MiB over 1 GiB/s.
    assert!((info.transfer.station_worst_case_secs - 118_652.34375).abs() < 1e-6);
}

#[test]
fn reduced_rate_cut_changes_only_the_cut() {
    let full = calc_video_info(&StorageAssumptions::default());
    let reduced = calc_video_info(&StorageAssumptions {
        emergency_cut_mode: EmergencyCutMode::ReducedRate,
        ..StorageAssumptions::default()
    });
    assert!(reduced.transfer.cellular_cut_secs < full.transfer.cellular_cut_secs);
    assert_eq!(reduced.daily, full.daily);
    assert_eq!(
        reduced.transfer.cellular_full_emergency_secs,
        full.transfer.cellular_full_emergency_secs
    );
}

#[test]
fn no_cameras_means_no_daily_video() {
    let info = calc_video_info(&StorageAssumptions {
        camera_fraction: 0.0,
        ..StorageAssumptions::default()
    });
    assert_eq!(info.daily.worst_case_bytes, 0.0);
    assert_eq!(info.transfer.station_average_secs, 0.0);
}
