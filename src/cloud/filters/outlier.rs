// SPDX-License-Identifier: GPL-3.0-only

//! Radius-based outlier removal
//!
//! A point survives only if at least `min_neighbors` other points lie
//! within `radius` of it. Neighbor lookup uses a spatial hash with cell
//! edge equal to the radius, so only the 27 surrounding cells need
//! checking per point. Invalid (NaN) points have no position and are
//! dropped.

use crate::cloud::{CloudPoint, PointCloud};
use std::collections::HashMap;
use tracing::warn;

fn cell_of(point: &CloudPoint, radius: f32) -> (i64, i64, i64) {
    (
        (point.x / radius).floor() as i64,
        (point.y / radius).floor() as i64,
        (point.z / radius).floor() as i64,
    )
}

/// Drop points with fewer than `min_neighbors` neighbors within `radius`
pub fn radius_outlier_removal(
    cloud: PointCloud,
    radius: f32,
    min_neighbors: usize,
) -> PointCloud {
    if radius <= 0.0 || !radius.is_finite() {
        warn!(radius, "Search radius must be positive, skipping outlier removal");
        return cloud;
    }
    if min_neighbors == 0 {
        // Every point trivially passes; still drop invalid ones
        let mut cloud = cloud;
        cloud.retain(|p| p.is_valid());
        return cloud;
    }

    let points: Vec<CloudPoint> = cloud
        .into_points()
        .into_iter()
        .filter(|p| p.is_valid())
        .collect();

    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (index, point) in points.iter().enumerate() {
        grid.entry(cell_of(point, radius)).or_default().push(index);
    }

    let radius_sq = radius * radius;
    let mut result = PointCloud::with_capacity(points.len());

    for (index, point) in points.iter().enumerate() {
        let (cx, cy, cz) = cell_of(point, radius);
        let mut neighbors = 0usize;

        'search: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &other in bucket {
                        if other == index {
                            continue;
                        }
                        let candidate = &points[other];
                        let ddx = candidate.x - point.x;
                        let ddy = candidate.y - point.y;
                        let ddz = candidate.z - point.z;
                        if ddx * ddx + ddy * ddy + ddz * ddz <= radius_sq {
                            neighbors += 1;
                            if neighbors >= min_neighbors {
                                break 'search;
                            }
                        }
                    }
                }
            }
        }

        if neighbors >= min_neighbors {
            result.push(*point);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f32, y: f32, z: f32) -> CloudPoint {
        CloudPoint {
            x,
            y,
            z,
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    #[test]
    fn test_isolated_point_removed() {
        let mut points = Vec::new();
        // Dense cluster near the origin
        for i in 0..10 {
            points.push(point(0.001 * i as f32, 0.0, 0.0));
        }
        // One point far away
        points.push(point(10.0, 10.0, 10.0));

        let out = radius_outlier_removal(PointCloud::from_points(points), 0.1, 3);
        assert_eq!(out.len(), 10);
        assert!(out.points().iter().all(|p| p.x < 1.0));
    }

    #[test]
    fn test_cluster_survives() {
        let points: Vec<CloudPoint> = (0..5).map(|i| point(0.01 * i as f32, 0.0, 0.0)).collect();
        let out = radius_outlier_removal(PointCloud::from_points(points), 0.2, 4);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_neighbors_across_cell_boundary() {
        // Two points straddling a grid cell edge, well within the radius
        let points = vec![point(0.099, 0.0, 0.0), point(0.101, 0.0, 0.0)];
        let out = radius_outlier_removal(PointCloud::from_points(points), 0.1, 1);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_zero_min_neighbors_keeps_valid_points() {
        let points = vec![point(0.0, 0.0, 0.0), CloudPoint::invalid()];
        let out = radius_outlier_removal(PointCloud::from_points(points), 0.1, 0);
        assert_eq!(out.len(), 1);
    }
}
