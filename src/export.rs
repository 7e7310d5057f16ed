// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud snapshot export
//!
//! Writes the displayed cloud as an uncompressed LAS 1.4 file with
//! color, named `<prefix>_<YYYYMMDD_HHMMSS>.las`. Invalid points carry
//! no position and are not written. Failures are surfaced to the caller
//! and logged; they never affect the running pipeline.

use crate::cloud::PointCloud;
use crate::constants::{LAS_COORDINATE_SCALE, SNAPSHOT_TIMESTAMP_FORMAT};
use crate::errors::SnapshotError;
use chrono::Local;
use las::{Builder, Color, Point, Writer};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Write `cloud` into `folder` as a timestamped LAS file
///
/// Returns the path of the written file.
pub fn save_point_cloud(
    folder: &Path,
    prefix: &str,
    cloud: &PointCloud,
) -> Result<PathBuf, SnapshotError> {
    let points: Vec<_> = cloud.points().iter().filter(|p| p.is_valid()).collect();
    if points.is_empty() {
        return Err(SnapshotError::EmptyCloud);
    }

    std::fs::create_dir_all(folder)?;

    let timestamp = Local::now().format(SNAPSHOT_TIMESTAMP_FORMAT);
    let path = folder.join(format!("{}_{}.las", prefix, timestamp));

    info!(
        point_count = points.len(),
        path = %path.display(),
        "Exporting point cloud"
    );

    // Bounds for the LAS header transforms
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for p in &points {
        let coords = [p.x as f64, p.y as f64, p.z as f64];
        for axis in 0..3 {
            min[axis] = min[axis].min(coords[axis]);
            max[axis] = max[axis].max(coords[axis]);
        }
    }

    let mut builder = Builder::from((1, 4)); // LAS 1.4
    builder.point_format.has_color = true;
    builder.point_format.is_compressed = false;
    builder.transforms = las::Vector {
        x: las::Transform {
            scale: LAS_COORDINATE_SCALE,
            offset: (min[0] + max[0]) / 2.0,
        },
        y: las::Transform {
            scale: LAS_COORDINATE_SCALE,
            offset: (min[1] + max[1]) / 2.0,
        },
        z: las::Transform {
            scale: LAS_COORDINATE_SCALE,
            offset: (min[2] + max[2]) / 2.0,
        },
    };

    let header = builder
        .into_header()
        .map_err(|e| SnapshotError::Encode(format!("Failed to build LAS header: {}", e)))?;

    let mut writer = Writer::from_path(&path, header)
        .map_err(|e| SnapshotError::Io(format!("Failed to create LAS writer: {}", e)))?;

    for p in points {
        let mut point = Point::default();
        point.x = p.x as f64;
        point.y = p.y as f64;
        point.z = p.z as f64;
        // LAS color channels are 16-bit
        point.color = Some(Color::new(
            p.r as u16 * 256,
            p.g as u16 * 256,
            p.b as u16 * 256,
        ));

        writer
            .write_point(point)
            .map_err(|e| SnapshotError::Encode(format!("Failed to write point: {}", e)))?;
    }

    writer
        .close()
        .map_err(|e| SnapshotError::Io(format!("Failed to close LAS file: {}", e)))?;

    debug!(path = %path.display(), "LAS export complete");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::CloudPoint;

    fn sample_cloud() -> PointCloud {
        let mut cloud = PointCloud::new();
        for i in 0..10 {
            cloud.push(CloudPoint {
                x: i as f32 * 0.1,
                y: 0.5,
                z: 2.0 + i as f32 * 0.01,
                r: 10,
                g: 200,
                b: 30,
                a: 255,
            });
        }
        cloud.push(CloudPoint::invalid());
        cloud
    }

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stereo-cloud-test-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_export_writes_las_file() {
        let dir = scratch_dir("export");
        let path = save_point_cloud(&dir, "test", &sample_cloud()).unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("test_"));
        assert!(name.ends_with(".las"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_cloud_is_error() {
        let dir = scratch_dir("empty");
        let result = save_point_cloud(&dir, "test", &PointCloud::new());
        assert!(matches!(result, Err(SnapshotError::EmptyCloud)));

        // A cloud of only invalid points has nothing to write either
        let mut invalid_only = PointCloud::new();
        invalid_only.push(CloudPoint::invalid());
        let result = save_point_cloud(&dir, "test", &invalid_only);
        assert!(matches!(result, Err(SnapshotError::EmptyCloud)));
    }
}
