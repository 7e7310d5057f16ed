// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline lifecycle
//!
//! [`PipelineContext`] owns every shared resource of one pipeline
//! instance: the frame pool, the cloud mailbox, the pick slot, and the
//! two worker controllers. Several independent pipelines can coexist in
//! one process; nothing here is global.
//!
//! Lifecycle: `new` allocates all buffers, `start` spawns the builder
//! and renderer threads, `stop` shuts both down within a bounded time
//! budget. `start` on a running pipeline and `stop` on a stopped one are
//! no-ops, so callers do not have to track state themselves.

mod builder;
mod renderer;
pub mod worker;

pub use renderer::{PickPoint, RenderSurface, SurfaceEvent};
pub use worker::{LoopAction, WorkerControl};

use crate::config::PipelineConfig;
use crate::constants::SHUTDOWN_TIMEOUT;
use crate::errors::{PipelineResult, SubmitError};
use crate::mailbox::CloudMailbox;
use crate::pool::{FrameInput, FramePool};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// One live point cloud pipeline
pub struct PipelineContext {
    config: PipelineConfig,
    pool: Arc<FramePool>,
    mailbox: Arc<CloudMailbox>,
    pick: Arc<Mutex<Option<PickPoint>>>,
    builder: Option<WorkerControl>,
    renderer: Option<WorkerControl>,
}

impl PipelineContext {
    /// Allocate the pool and mailbox; no threads start here
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        let pool = FramePool::new(
            config.capacity,
            config.width,
            config.height,
            config.latest_wins,
            config.allow_overwrite,
        )?;

        info!(
            capacity = config.capacity,
            width = config.width,
            height = config.height,
            latest_wins = config.latest_wins,
            "Pipeline initialized"
        );

        Ok(Self {
            config,
            pool: Arc::new(pool),
            mailbox: Arc::new(CloudMailbox::new()),
            pick: Arc::new(Mutex::new(None)),
            builder: None,
            renderer: None,
        })
    }

    /// Spawn the builder and renderer threads
    ///
    /// Takes ownership of the surface for the lifetime of the session.
    /// No-op when already running. Leftovers from a previous session
    /// (pooled frames, an unconsumed cloud, a stale pick) are cleared
    /// first.
    pub fn start(&mut self, surface: Box<dyn RenderSurface>) {
        if self.is_running() {
            warn!("Pipeline already running, start ignored");
            return;
        }

        self.pool.reset();
        self.mailbox.clear();
        *self.pick.lock().unwrap() = None;

        self.builder = Some(builder::spawn_builder(
            Arc::clone(&self.pool),
            Arc::clone(&self.mailbox),
        ));
        self.renderer = Some(renderer::spawn_renderer(
            Arc::clone(&self.mailbox),
            Arc::clone(&self.pick),
            surface,
            self.config.snapshot_folder.clone(),
        ));

        info!("Pipeline started");
    }

    /// Stop both workers, waiting a bounded time for each
    ///
    /// Returns `true` when both threads exited within the budget. Safe
    /// to call repeatedly or after a partial start.
    pub fn stop(&mut self) -> bool {
        if self.builder.is_none() && self.renderer.is_none() {
            return true;
        }

        // Raise both flags before waiting on either so the workers wind
        // down in parallel
        if let Some(builder) = &self.builder {
            builder.request_stop();
        }
        if let Some(renderer) = &self.renderer {
            renderer.request_stop();
        }

        let mut clean = true;
        if let Some(mut builder) = self.builder.take() {
            clean &= builder.stop_with_timeout(SHUTDOWN_TIMEOUT);
        }
        if let Some(mut renderer) = self.renderer.take() {
            clean &= renderer.stop_with_timeout(SHUTDOWN_TIMEOUT);
        }

        if clean {
            info!("Pipeline stopped");
        } else {
            warn!("Pipeline stopped with unresponsive workers");
        }
        clean
    }

    /// Whether either worker thread is alive
    pub fn is_running(&self) -> bool {
        self.builder.as_ref().map(|w| w.is_running()).unwrap_or(false)
            || self.renderer.as_ref().map(|w| w.is_running()).unwrap_or(false)
    }

    /// Submit one frame to the pool
    ///
    /// `timestamp` is the caller's monotonic frame time, returned later
    /// through pool freshness checks and logs.
    pub fn submit(&self, frame: &FrameInput<'_>, timestamp: u64) -> Result<(), SubmitError> {
        if !self.is_running() {
            return Err(SubmitError::NotActive);
        }
        self.pool.put(frame, timestamp)
    }

    /// Take the most recent picked point, if any
    ///
    /// Consuming read: a second call returns `None` until the next pick.
    pub fn poll_pick(&self) -> Option<PickPoint> {
        self.pick.lock().unwrap().take()
    }

    /// Ask the renderer to switch to full-screen (`true`) or back to the
    /// original view size (`false`)
    pub fn request_full_screen(&self, enabled: bool) {
        self.mailbox.request_full_screen(enabled);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

impl Drop for PipelineContext {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::PointCloud;
    use crate::config::{CameraIntrinsics, FilterParameters};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    struct CountingSurface {
        rendered: Arc<AtomicUsize>,
    }

    impl RenderSurface for CountingSurface {
        fn poll_events(&mut self) -> Vec<SurfaceEvent> {
            Vec::new()
        }

        fn render(&mut self, _cloud: &PointCloud) {
            self.rendered.fetch_add(1, Ordering::SeqCst);
        }

        fn set_full_screen(&mut self, _enabled: bool) {}
    }

    fn small_config() -> PipelineConfig {
        PipelineConfig {
            capacity: 2,
            width: 4,
            height: 4,
            ..PipelineConfig::default()
        }
    }

    fn submit_one(context: &PipelineContext, timestamp: u64) -> Result<(), SubmitError> {
        let image = vec![120u8; 4 * 4 * 3];
        let disparity = vec![8.0f32; 16];
        context.submit(
            &FrameInput {
                width: 4,
                height: 4,
                channels: 3,
                image: &image,
                disparity: &disparity,
                disparity_color: None,
                intrinsics: CameraIntrinsics::default(),
                filters: FilterParameters::default(),
            },
            timestamp,
        )
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.width = 0;
        assert!(PipelineContext::new(config).is_err());

        let mut config = small_config();
        config.capacity = 0;
        assert!(PipelineContext::new(config).is_err());
    }

    #[test]
    fn test_submit_when_stopped_fails() {
        let context = PipelineContext::new(small_config()).unwrap();
        assert_eq!(submit_one(&context, 1), Err(SubmitError::NotActive));
    }

    #[test]
    fn test_start_submit_render_stop() {
        let rendered = Arc::new(AtomicUsize::new(0));
        let mut context = PipelineContext::new(small_config()).unwrap();
        context.start(Box::new(CountingSurface {
            rendered: Arc::clone(&rendered),
        }));
        assert!(context.is_running());

        submit_one(&context, 1).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while rendered.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline, "frame was never rendered");
            thread::sleep(Duration::from_millis(5));
        }

        assert!(context.stop());
        assert!(!context.is_running());
        // Idempotent
        assert!(context.stop());
    }

    #[test]
    fn test_stop_is_bounded() {
        let mut context = PipelineContext::new(small_config()).unwrap();
        context.start(Box::new(CountingSurface {
            rendered: Arc::new(AtomicUsize::new(0)),
        }));

        let start = Instant::now();
        assert!(context.stop());
        assert!(start.elapsed() < SHUTDOWN_TIMEOUT);
    }

    #[test]
    fn test_poll_pick_consumes() {
        let context = PipelineContext::new(small_config()).unwrap();
        *context.pick.lock().unwrap() = Some(PickPoint {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        });
        assert!(context.poll_pick().is_some());
        assert!(context.poll_pick().is_none());
    }

    #[test]
    fn test_restart_clears_previous_session() {
        let rendered = Arc::new(AtomicUsize::new(0));
        let mut context = PipelineContext::new(small_config()).unwrap();

        context.start(Box::new(CountingSurface {
            rendered: Arc::clone(&rendered),
        }));
        submit_one(&context, 1).unwrap();
        context.stop();

        *context.pick.lock().unwrap() = Some(PickPoint {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        });

        context.start(Box::new(CountingSurface {
            rendered: Arc::clone(&rendered),
        }));
        // The stale pick from before the restart is gone
        assert!(context.poll_pick().is_none());
        assert!(context.stop());
    }
}
