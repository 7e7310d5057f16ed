// SPDX-License-Identifier: GPL-3.0-only

//! Colored point cloud data model
//!
//! A freshly built cloud is organized: one point per source pixel in
//! row-major order, with non-reprojectable pixels represented as explicit
//! NaN-marked points instead of being omitted. Filters may break that
//! correspondence; the cloud itself is just an ordered point collection.
//!
//! Clouds are owned by exactly one pipeline stage at a time and move from
//! builder to mailbox to renderer; they are never shared-mutated.

pub mod filters;
pub mod reproject;

pub use reproject::{FrameView, build_point_cloud};

/// A single colored 3D point (meters, RGBA color)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl CloudPoint {
    /// Marker for a pixel whose disparity could not be reprojected
    pub fn invalid() -> Self {
        Self {
            x: f32::NAN,
            y: f32::NAN,
            z: f32::NAN,
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    /// A point is valid when all three coordinates are finite
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Ordered collection of colored 3D points
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    points: Vec<CloudPoint>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<CloudPoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: CloudPoint) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CloudPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [CloudPoint] {
        &mut self.points
    }

    pub fn into_points(self) -> Vec<CloudPoint> {
        self.points
    }

    /// Number of points with finite coordinates
    pub fn valid_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_valid()).count()
    }

    /// Keep only points for which the predicate holds
    pub fn retain<F: FnMut(&CloudPoint) -> bool>(&mut self, f: F) {
        self.points.retain(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_point_is_not_valid() {
        assert!(!CloudPoint::invalid().is_valid());
    }

    #[test]
    fn test_valid_count() {
        let mut cloud = PointCloud::new();
        cloud.push(CloudPoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            r: 10,
            g: 20,
            b: 30,
            a: 255,
        });
        cloud.push(CloudPoint::invalid());
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.valid_count(), 1);
    }
}
