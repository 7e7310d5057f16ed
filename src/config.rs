// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline and filter configuration
//!
//! `FilterParameters` is a value object: a copy travels with every
//! submitted frame and is read-only afterwards, so a settings change in
//! the embedding GUI never affects frames already in flight.

use crate::constants::{
    DEFAULT_OUTLIER_MIN_NEIGHBORS, DEFAULT_OUTLIER_RADIUS, DEFAULT_PASS_THROUGH_MAX,
    DEFAULT_PASS_THROUGH_MIN, DEFAULT_PLANE_THRESHOLD, DEFAULT_POOL_CAPACITY, DEFAULT_VOXEL_SIZE,
};
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Closed interval used by the pass-through filter, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

/// Enable flags and numeric settings for the filter chain
///
/// Stage order is fixed (see [`crate::cloud::filters`]); these flags only
/// decide which stages run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    /// Drop points marked invalid (NaN coordinates)
    pub remove_invalid: bool,
    /// Keep only points whose depth lies inside `pass_through_range`
    pub pass_through: bool,
    /// Depth range in meters for the pass-through filter
    pub pass_through_range: Range,
    /// Merge points within one voxel cell into a single representative
    pub down_sampling: bool,
    /// Voxel edge length in meters
    pub voxel_size: f32,
    /// Drop points with too few neighbors inside `radius_search`
    pub radius_outlier_removal: bool,
    /// Neighbor search radius in meters
    pub radius_search: f32,
    /// Minimum neighbors a point must have to survive outlier removal
    pub min_neighbors: usize,
    /// Detect the dominant plane and recolor its inliers
    pub plane_detection: bool,
    /// RANSAC point-to-plane distance threshold in meters
    pub plane_distance_threshold: f32,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            remove_invalid: false,
            pass_through: false,
            pass_through_range: Range {
                min: DEFAULT_PASS_THROUGH_MIN,
                max: DEFAULT_PASS_THROUGH_MAX,
            },
            down_sampling: false,
            voxel_size: DEFAULT_VOXEL_SIZE,
            radius_outlier_removal: false,
            radius_search: DEFAULT_OUTLIER_RADIUS,
            min_neighbors: DEFAULT_OUTLIER_MIN_NEIGHBORS,
            plane_detection: false,
            plane_distance_threshold: DEFAULT_PLANE_THRESHOLD,
        }
    }
}

/// Camera calibration constants converting disparity to metric depth
///
/// Supplied per frame by the camera accessor: `z = bf / (d - d_inf)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Physical distance between the two stereo sensors, in meters
    pub baseline: f64,
    /// Focal length times baseline
    pub bf: f64,
    /// Disparity offset corresponding to infinite distance
    pub d_inf: f64,
}

impl Default for CameraIntrinsics {
    fn default() -> Self {
        Self {
            baseline: 0.1,
            bf: 60.0,
            d_inf: 0.0,
        }
    }
}

/// Fixed-at-start pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of frame slots in the pool
    pub capacity: usize,
    /// Frame width in pixels; slot buffers are sized once from this
    pub width: usize,
    /// Frame height in pixels
    pub height: usize,
    /// true: consumer always starts from the newest ready slot,
    /// false: strict FIFO ordering
    pub latest_wins: bool,
    /// Allow the producer to overwrite unread slots when the pool wraps
    pub allow_overwrite: bool,
    /// Folder for snapshot files written on the snapshot key
    pub snapshot_folder: PathBuf,
    /// Filter settings the demo source attaches to every frame
    #[serde(default)]
    pub filters: FilterParameters,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_POOL_CAPACITY,
            width: 640,
            height: 480,
            // Live display mode: render the newest frame, drop stale ones
            latest_wins: true,
            allow_overwrite: true,
            snapshot_folder: std::env::temp_dir(),
            filters: FilterParameters::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Serialize the configuration to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), PipelineError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, contents)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parameters_default_all_disabled() {
        let params = FilterParameters::default();
        assert!(!params.remove_invalid);
        assert!(!params.pass_through);
        assert!(!params.down_sampling);
        assert!(!params.radius_outlier_removal);
        assert!(!params.plane_detection);
    }

    #[test]
    fn test_filter_parameters_json_round_trip() {
        let mut params = FilterParameters::default();
        params.pass_through = true;
        params.pass_through_range = Range { min: 1.0, max: 9.5 };
        params.min_neighbors = 12;

        let json = serde_json::to_string(&params).unwrap();
        let back: FilterParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_pipeline_config_default_is_latest_wins() {
        let config = PipelineConfig::default();
        assert!(config.latest_wins);
        assert!(config.allow_overwrite);
        assert!(config.capacity > 0);
    }
}
