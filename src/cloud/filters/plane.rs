// SPDX-License-Identifier: GPL-3.0-only

//! RANSAC plane detection
//!
//! Fits the dominant plane by repeatedly sampling three points, counting
//! inliers within the distance threshold, and keeping the best model.
//! Inliers are recolored pure red; no points are removed. Failing to find
//! a plane leaves the cloud unmodified and is not an error.

use crate::cloud::{CloudPoint, PointCloud};
use crate::constants::PLANE_RANSAC_ITERATIONS;
use rand::Rng;
use tracing::debug;

struct Plane {
    normal: [f32; 3],
    d: f32,
}

impl Plane {
    /// Plane through three points; None when they are (near) collinear
    fn from_points(a: &CloudPoint, b: &CloudPoint, c: &CloudPoint) -> Option<Self> {
        let ab = [b.x - a.x, b.y - a.y, b.z - a.z];
        let ac = [c.x - a.x, c.y - a.y, c.z - a.z];
        let normal = [
            ab[1] * ac[2] - ab[2] * ac[1],
            ab[2] * ac[0] - ab[0] * ac[2],
            ab[0] * ac[1] - ab[1] * ac[0],
        ];
        let length = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2]).sqrt();
        if length < 1e-9 {
            return None;
        }
        let normal = [normal[0] / length, normal[1] / length, normal[2] / length];
        let d = -(normal[0] * a.x + normal[1] * a.y + normal[2] * a.z);
        Some(Self { normal, d })
    }

    fn distance(&self, point: &CloudPoint) -> f32 {
        (self.normal[0] * point.x + self.normal[1] * point.y + self.normal[2] * point.z + self.d)
            .abs()
    }
}

/// Recolor inliers of the dominant plane (red); removes nothing
pub fn detect_plane(mut cloud: PointCloud, distance_threshold: f32) -> PointCloud {
    let valid_indices: Vec<usize> = cloud
        .points()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_valid())
        .map(|(i, _)| i)
        .collect();

    if valid_indices.len() < 3 || distance_threshold <= 0.0 {
        debug!(
            valid_points = valid_indices.len(),
            "Not enough points for plane detection"
        );
        return cloud;
    }

    let mut rng = rand::rng();
    let mut best_count = 0usize;
    let mut best_plane: Option<Plane> = None;

    for _ in 0..PLANE_RANSAC_ITERATIONS {
        let i = valid_indices[rng.random_range(0..valid_indices.len())];
        let j = valid_indices[rng.random_range(0..valid_indices.len())];
        let k = valid_indices[rng.random_range(0..valid_indices.len())];
        if i == j || j == k || i == k {
            continue;
        }

        let points = cloud.points();
        let Some(plane) = Plane::from_points(&points[i], &points[j], &points[k]) else {
            continue;
        };

        let count = valid_indices
            .iter()
            .filter(|&&idx| plane.distance(&points[idx]) <= distance_threshold)
            .count();

        if count > best_count {
            best_count = count;
            best_plane = Some(plane);
        }
    }

    let Some(plane) = best_plane else {
        debug!("Could not estimate a planar model for the cloud");
        return cloud;
    };

    let mut inliers = 0usize;
    for point in cloud.points_mut() {
        if point.is_valid() && plane.distance(point) <= distance_threshold {
            point.r = 255;
            point.g = 0;
            point.b = 0;
            inliers += 1;
        }
    }

    debug!(inliers, "Plane detected");
    cloud
}
