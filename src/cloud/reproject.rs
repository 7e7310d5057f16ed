// SPDX-License-Identifier: GPL-3.0-only

//! Disparity to 3D reprojection
//!
//! Turns a disparity map plus a co-registered base image into an organized
//! XYZRGBA cloud. For pixel (r, c) with `value = disparity - d_inf`:
//!
//! ```text
//! x = baseline * (c - width/2)  / value
//! y = baseline * (height/2 - r) / value
//! z = bf / value
//! ```
//!
//! Pixels with `value <= 0` become explicit invalid points so the output
//! always has exactly `width * height` points in row-major order. Range
//! culling is NOT done here; out-of-range points are emitted and left to
//! the explicit pass-through stage.

use super::{CloudPoint, PointCloud};
use crate::config::CameraIntrinsics;

/// Borrowed view of one frame's pixel data
///
/// `image` is tightly packed with `channels` bytes per pixel (1 = gray,
/// 3 = RGB, 4 = RGBA); `disparity` holds one f32 per pixel. Both describe
/// the same `width * height` grid.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub image: &'a [u8],
    pub disparity: &'a [f32],
}

impl FrameView<'_> {
    /// Buffers are present and cover the stated dimensions
    pub fn is_complete(&self) -> bool {
        let pixels = self.width * self.height;
        pixels > 0
            && matches!(self.channels, 1 | 3 | 4)
            && self.image.len() >= pixels * self.channels
            && self.disparity.len() >= pixels
    }
}

/// Build a colored point cloud from a disparity map and base image
///
/// The result has one point per source pixel, row-major. Grayscale input
/// replicates the intensity into all three color channels.
pub fn build_point_cloud(frame: &FrameView<'_>, intrinsics: &CameraIntrinsics) -> PointCloud {
    let width = frame.width;
    let height = frame.height;
    let channels = frame.channels;

    let mut cloud = PointCloud::with_capacity(width * height);

    let xc = (width / 2) as f32;
    let yc = (height / 2) as f32;
    let baseline = intrinsics.baseline as f32;
    let bf = intrinsics.bf as f32;
    let d_inf = intrinsics.d_inf as f32;

    for row in 0..height {
        for col in 0..width {
            let idx = row * width + col;
            let value = frame.disparity[idx] - d_inf;

            if value <= 0.0 {
                cloud.push(CloudPoint::invalid());
                continue;
            }

            let x = baseline * (col as f32 - xc) / value;
            let y = baseline * (yc - row as f32) / value;
            let z = bf / value;

            let base = idx * channels;
            let (r, g, b) = match channels {
                3 | 4 => (
                    frame.image[base],
                    frame.image[base + 1],
                    frame.image[base + 2],
                ),
                _ => {
                    let v = frame.image[base];
                    (v, v, v)
                }
            };

            cloud.push(CloudPoint {
                x,
                y,
                z,
                r,
                g,
                b,
                a: 255,
            });
        }
    }

    cloud
}
