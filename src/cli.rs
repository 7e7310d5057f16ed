// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for running the pipeline without a GUI
//!
//! The demo drives the full pipeline with a synthetic stereo source: a
//! horizontal disparity ramp under a color gradient, submitted at a
//! fixed rate through a surface that logs instead of drawing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use stereo_cloud::cloud::PointCloud;
use stereo_cloud::pipeline::{PipelineContext, RenderSurface, SurfaceEvent};
use stereo_cloud::pool::FrameInput;
use stereo_cloud::{CameraIntrinsics, PipelineConfig};
use tracing::{debug, info};

/// Surface that logs render calls instead of drawing
///
/// Emits a single snapshot key event when `snapshot_request` is raised,
/// so the demo can exercise the export path without a window.
struct LoggingSurface {
    snapshot_request: Arc<AtomicBool>,
    rendered: u64,
}

impl RenderSurface for LoggingSurface {
    fn poll_events(&mut self) -> Vec<SurfaceEvent> {
        if self.snapshot_request.swap(false, Ordering::SeqCst) {
            vec![SurfaceEvent::SnapshotKey]
        } else {
            Vec::new()
        }
    }

    fn render(&mut self, cloud: &PointCloud) {
        self.rendered += 1;
        debug!(
            frame = self.rendered,
            points = cloud.len(),
            valid = cloud.valid_count(),
            "Rendered cloud"
        );
    }

    fn set_full_screen(&mut self, enabled: bool) {
        info!(enabled, "Full-screen change");
    }
}

/// Fill one synthetic frame: disparity ramps left to right, color
/// follows pixel position
fn synthetic_frame(width: usize, height: usize, phase: u64, image: &mut [u8], disparity: &mut [f32]) {
    for row in 0..height {
        for col in 0..width {
            let index = row * width + col;
            // Ramp from 20 down to 4 pixels of disparity, drifting with
            // the frame counter so consecutive clouds differ
            let t = (col + phase as usize) % width;
            disparity[index] = 20.0 - 16.0 * (t as f32 / width as f32);
            image[index * 3] = (col * 255 / width) as u8;
            image[index * 3 + 1] = (row * 255 / height) as u8;
            image[index * 3 + 2] = 128;
        }
    }
}

/// Run the pipeline against the synthetic source
pub fn run_demo(
    frames: u64,
    config_path: Option<PathBuf>,
    snapshot: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => PipelineConfig::load_from_file(&path)?,
        None => PipelineConfig {
            width: 160,
            height: 120,
            ..PipelineConfig::default()
        },
    };

    let width = config.width;
    let height = config.height;
    let filters = config.filters;
    let frame_interval = Duration::from_millis(33);

    info!(frames, width, height, "Starting demo pipeline");

    let snapshot_request = Arc::new(AtomicBool::new(false));
    let mut pipeline = PipelineContext::new(config)?;
    pipeline.start(Box::new(LoggingSurface {
        snapshot_request: Arc::clone(&snapshot_request),
        rendered: 0,
    }));

    let mut image = vec![0u8; width * height * 3];
    let mut disparity = vec![0.0f32; width * height];

    for timestamp in 0..frames {
        synthetic_frame(width, height, timestamp, &mut image, &mut disparity);

        let frame = FrameInput {
            width,
            height,
            channels: 3,
            image: &image,
            disparity: &disparity,
            disparity_color: None,
            intrinsics: CameraIntrinsics::default(),
            filters,
        };
        if let Err(e) = pipeline.submit(&frame, timestamp) {
            debug!(timestamp, error = %e, "Frame dropped");
        }

        if let Some(point) = pipeline.poll_pick() {
            info!(x = point.x, y = point.y, z = point.z, "Point picked");
        }

        if snapshot && timestamp == frames - 1 {
            snapshot_request.store(true, Ordering::SeqCst);
        }

        thread::sleep(frame_interval);
    }

    // Let the renderer drain the snapshot request before shutdown
    if snapshot {
        thread::sleep(Duration::from_millis(200));
    }

    if pipeline.stop() {
        info!("Demo finished");
        Ok(())
    } else {
        Err("pipeline workers did not stop cleanly".into())
    }
}

/// Write the default configuration as pretty-printed JSON
pub fn write_default_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::default();
    config.save_to_file(output)?;
    println!("Wrote default configuration to {}", output.display());
    Ok(())
}
