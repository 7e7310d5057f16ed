// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use stereo_cloud::{FilterParameters, PipelineConfig, Range};

#[test]
fn test_config_default() {
    let config = PipelineConfig::default();

    // Live display defaults: latest frame wins, stale slots reusable
    assert!(
        config.latest_wins,
        "Latest-wins delivery should be the default"
    );
    assert!(
        config.allow_overwrite,
        "Overwrite should be allowed by default"
    );
    assert!(config.capacity > 0, "Pool must have at least one slot");
    assert!(config.width > 0 && config.height > 0);
}

#[test]
fn test_filters_default_all_disabled() {
    let filters = FilterParameters::default();
    assert!(!filters.remove_invalid);
    assert!(!filters.pass_through);
    assert!(!filters.down_sampling);
    assert!(!filters.radius_outlier_removal);
    assert!(!filters.plane_detection);
    // Numeric defaults still sensible for when a stage is switched on
    assert!(filters.pass_through_range.min < filters.pass_through_range.max);
    assert!(filters.voxel_size > 0.0);
    assert!(filters.radius_search > 0.0);
    assert!(filters.plane_distance_threshold > 0.0);
}

#[test]
fn test_config_file_round_trip() {
    let mut config = PipelineConfig::default();
    config.capacity = 8;
    config.width = 1280;
    config.height = 720;
    config.latest_wins = false;
    config.filters.pass_through = true;
    config.filters.pass_through_range = Range { min: 0.3, max: 12.0 };

    let path = std::env::temp_dir().join(format!(
        "stereo-cloud-config-{}.json",
        std::process::id()
    ));
    config.save_to_file(&path).unwrap();
    let loaded = PipelineConfig::load_from_file(&path).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.capacity, 8);
    assert_eq!(loaded.width, 1280);
    assert_eq!(loaded.height, 720);
    assert!(!loaded.latest_wins);
    assert_eq!(loaded.filters, config.filters);
}

#[test]
fn test_config_missing_filters_falls_back_to_default() {
    // Older config files without a filters section still load
    let json = r#"{
        "capacity": 4,
        "width": 640,
        "height": 480,
        "latest_wins": true,
        "allow_overwrite": true,
        "snapshot_folder": "/tmp"
    }"#;
    let config: PipelineConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.filters, FilterParameters::default());
}

#[test]
fn test_config_load_missing_file_fails() {
    let path = std::env::temp_dir().join("stereo-cloud-does-not-exist.json");
    assert!(PipelineConfig::load_from_file(&path).is_err());
}
