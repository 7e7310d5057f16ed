// SPDX-License-Identifier: GPL-3.0-only

//! Voxel grid downsampling
//!
//! Points falling into the same cubic grid cell of edge `leaf_size` are
//! collapsed to their centroid with averaged color, so at most one point
//! per occupied cell survives. Invalid (NaN) points cannot be binned and
//! are dropped.

use crate::cloud::{CloudPoint, PointCloud};
use std::collections::HashMap;
use tracing::warn;

#[derive(Default)]
struct CellAccumulator {
    sum_x: f64,
    sum_y: f64,
    sum_z: f64,
    sum_r: u64,
    sum_g: u64,
    sum_b: u64,
    sum_a: u64,
    count: u64,
}

impl CellAccumulator {
    fn add(&mut self, point: &CloudPoint) {
        self.sum_x += point.x as f64;
        self.sum_y += point.y as f64;
        self.sum_z += point.z as f64;
        self.sum_r += point.r as u64;
        self.sum_g += point.g as u64;
        self.sum_b += point.b as u64;
        self.sum_a += point.a as u64;
        self.count += 1;
    }

    fn centroid(&self) -> CloudPoint {
        let n = self.count as f64;
        CloudPoint {
            x: (self.sum_x / n) as f32,
            y: (self.sum_y / n) as f32,
            z: (self.sum_z / n) as f32,
            r: (self.sum_r / self.count) as u8,
            g: (self.sum_g / self.count) as u8,
            b: (self.sum_b / self.count) as u8,
            a: (self.sum_a / self.count) as u8,
        }
    }
}

/// Collapse the cloud onto a 3D grid of edge `leaf_size` meters
pub fn voxel_downsample(cloud: PointCloud, leaf_size: f32) -> PointCloud {
    if leaf_size <= 0.0 || !leaf_size.is_finite() {
        warn!(leaf_size, "Voxel size must be positive, skipping downsample");
        return cloud;
    }

    let mut cells: HashMap<(i64, i64, i64), CellAccumulator> = HashMap::new();

    for point in cloud.points() {
        if !point.is_valid() {
            continue;
        }
        let key = (
            (point.x / leaf_size).floor() as i64,
            (point.y / leaf_size).floor() as i64,
            (point.z / leaf_size).floor() as i64,
        );
        cells.entry(key).or_default().add(point);
    }

    let mut result = PointCloud::with_capacity(cells.len());
    for accumulator in cells.values() {
        result.push(accumulator.centroid());
    }
    result
}
