// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud filter chain
//!
//! Stages are tagged variants assembled into an ordered list from
//! [`FilterParameters`], so each one can be toggled independently and new
//! stages slot in without touching the builder loop. The fixed order is:
//! remove-invalid, pass-through, voxel downsample, radius outlier
//! removal, plane detection. Each stage consumes one cloud and produces
//! the next.

mod outlier;
mod plane;
mod voxel;

pub use outlier::radius_outlier_removal;
pub use plane::detect_plane;
pub use voxel::voxel_downsample;

use super::PointCloud;
use crate::config::FilterParameters;
use tracing::debug;

/// One configured, independently toggleable filter stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterStage {
    /// Drop points marked NaN
    RemoveInvalid,
    /// Keep only points with depth in `[min, max]`
    PassThrough { min: f32, max: f32 },
    /// One representative point per 3D grid cell
    VoxelDownsample { leaf_size: f32 },
    /// Drop points with fewer than `min_neighbors` within `radius`
    RadiusOutlierRemoval { radius: f32, min_neighbors: usize },
    /// Recolor inliers of the dominant RANSAC plane (removes nothing)
    PlaneDetection { distance_threshold: f32 },
}

impl FilterStage {
    pub fn name(&self) -> &'static str {
        match self {
            FilterStage::RemoveInvalid => "remove-invalid",
            FilterStage::PassThrough { .. } => "pass-through",
            FilterStage::VoxelDownsample { .. } => "voxel-downsample",
            FilterStage::RadiusOutlierRemoval { .. } => "radius-outlier-removal",
            FilterStage::PlaneDetection { .. } => "plane-detection",
        }
    }

    /// Run this stage, consuming the input cloud
    pub fn apply(&self, cloud: PointCloud) -> PointCloud {
        match *self {
            FilterStage::RemoveInvalid => remove_invalid(cloud),
            FilterStage::PassThrough { min, max } => pass_through(cloud, min, max),
            FilterStage::VoxelDownsample { leaf_size } => voxel_downsample(cloud, leaf_size),
            FilterStage::RadiusOutlierRemoval {
                radius,
                min_neighbors,
            } => radius_outlier_removal(cloud, radius, min_neighbors),
            FilterStage::PlaneDetection { distance_threshold } => {
                detect_plane(cloud, distance_threshold)
            }
        }
    }
}

/// Assemble the enabled stages in their fixed order
pub fn stages_for(params: &FilterParameters) -> Vec<FilterStage> {
    let mut stages = Vec::new();
    if params.remove_invalid {
        stages.push(FilterStage::RemoveInvalid);
    }
    if params.pass_through {
        stages.push(FilterStage::PassThrough {
            min: params.pass_through_range.min,
            max: params.pass_through_range.max,
        });
    }
    if params.down_sampling {
        stages.push(FilterStage::VoxelDownsample {
            leaf_size: params.voxel_size,
        });
    }
    if params.radius_outlier_removal {
        stages.push(FilterStage::RadiusOutlierRemoval {
            radius: params.radius_search,
            min_neighbors: params.min_neighbors,
        });
    }
    if params.plane_detection {
        stages.push(FilterStage::PlaneDetection {
            distance_threshold: params.plane_distance_threshold,
        });
    }
    stages
}

/// Run every stage in order over the cloud
pub fn apply_chain(mut cloud: PointCloud, stages: &[FilterStage]) -> PointCloud {
    for stage in stages {
        let before = cloud.len();
        cloud = stage.apply(cloud);
        debug!(
            stage = stage.name(),
            points_in = before,
            points_out = cloud.len(),
            "Filter stage applied"
        );
    }
    cloud
}

/// Drop points with NaN coordinates
fn remove_invalid(mut cloud: PointCloud) -> PointCloud {
    cloud.retain(|p| p.is_valid());
    cloud
}

/// Keep only points whose depth lies in `[min, max]`
///
/// NaN depth compares false against both bounds, so invalid points are
/// removed here as well, matching the usual pass-through behavior.
fn pass_through(mut cloud: PointCloud, min: f32, max: f32) -> PointCloud {
    cloud.retain(|p| p.z >= min && p.z <= max);
    cloud
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::CloudPoint;
    use crate::config::Range;

    fn point(z: f32) -> CloudPoint {
        CloudPoint {
            x: 0.0,
            y: 0.0,
            z,
            r: 1,
            g: 2,
            b: 3,
            a: 255,
        }
    }

    #[test]
    fn test_stage_order_is_fixed() {
        let mut params = FilterParameters::default();
        params.plane_detection = true;
        params.remove_invalid = true;
        params.down_sampling = true;

        let stages = stages_for(&params);
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0], FilterStage::RemoveInvalid);
        assert!(matches!(stages[1], FilterStage::VoxelDownsample { .. }));
        assert!(matches!(stages[2], FilterStage::PlaneDetection { .. }));
    }

    #[test]
    fn test_no_stages_when_all_disabled() {
        assert!(stages_for(&FilterParameters::default()).is_empty());
    }

    #[test]
    fn test_remove_invalid() {
        let cloud = PointCloud::from_points(vec![point(1.0), CloudPoint::invalid(), point(2.0)]);
        let filtered = remove_invalid(cloud);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.points().iter().all(|p| p.is_valid()));
    }

    #[test]
    fn test_pass_through_bounds_inclusive() {
        let cloud = PointCloud::from_points(vec![
            point(0.4),
            point(0.5),
            point(10.0),
            point(50.0),
            point(50.1),
            CloudPoint::invalid(),
        ]);
        let filtered = pass_through(cloud, 0.5, 50.0);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_pass_through_is_idempotent() {
        let cloud = PointCloud::from_points(vec![point(0.9), point(3.0), point(7.5), point(80.0)]);
        let once = pass_through(cloud, 1.0, 10.0);
        let twice = pass_through(once.clone(), 1.0, 10.0);
        assert_eq!(once.points(), twice.points());
    }

    #[test]
    fn test_chain_runs_in_order() {
        let mut params = FilterParameters::default();
        params.remove_invalid = true;
        params.pass_through = true;
        params.pass_through_range = Range { min: 1.0, max: 5.0 };

        let cloud = PointCloud::from_points(vec![point(0.5), point(3.0), CloudPoint::invalid()]);
        let out = apply_chain(cloud, &stages_for(&params));
        assert_eq!(out.len(), 1);
        assert_eq!(out.points()[0].z, 3.0);
    }
}
