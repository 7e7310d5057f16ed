// SPDX-License-Identifier: GPL-3.0-only

//! Renderer worker
//!
//! Once per display refresh: poll surface events, consume the one-shot
//! screen-change flags, then wait (bounded) on the mailbox and
//! hard-replace the displayed cloud with whatever arrives — no blending
//! between consecutive clouds.
//!
//! The actual drawing is delegated to a [`RenderSurface`] implemented by
//! the embedding application; the core never creates windows or graphics
//! contexts. Surface events feed back into the pipeline: picks land in a
//! single latest-wins slot read by `poll_pick`, and the snapshot key
//! clones the displayed cloud and writes it on a short-lived background
//! thread so neither the renderer nor the builder stalls on disk I/O.

use super::worker::{LoopAction, WorkerControl};
use crate::cloud::PointCloud;
use crate::constants::{RENDER_WAIT_TIMEOUT, SNAPSHOT_PREFIX};
use crate::export::save_point_cloud;
use crate::mailbox::CloudMailbox;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

/// A 3D coordinate picked by the user on the rendered view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// User interaction reported by the render surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// A point on the displayed cloud was picked
    PointPicked(PickPoint),
    /// The snapshot key was pressed
    SnapshotKey,
    /// The window was closed; the renderer loop ends
    CloseRequested,
}

/// Drawing and input boundary implemented by the embedding application
pub trait RenderSurface: Send {
    /// Collect pending window/input events
    fn poll_events(&mut self) -> Vec<SurfaceEvent>;

    /// Draw the given cloud, replacing the previous one
    fn render(&mut self, cloud: &PointCloud);

    /// Switch between full-screen and the original view size
    fn set_full_screen(&mut self, enabled: bool);
}

/// Spawn the renderer loop, taking ownership of the surface
pub(crate) fn spawn_renderer(
    mailbox: Arc<CloudMailbox>,
    pick: Arc<Mutex<Option<PickPoint>>>,
    mut surface: Box<dyn RenderSurface>,
    snapshot_folder: PathBuf,
) -> WorkerControl {
    // Displayed cloud is thread-local to the renderer; ownership arrived
    // by move through the mailbox
    let mut current: Option<PointCloud> = None;

    WorkerControl::spawn("cloud-renderer", move || {
        for event in surface.poll_events() {
            match event {
                SurfaceEvent::PointPicked(point) => {
                    // Latest pick wins; at most one outstanding
                    *pick.lock().unwrap() = Some(point);
                }
                SurfaceEvent::SnapshotKey => {
                    save_snapshot(current.as_ref(), &snapshot_folder);
                }
                SurfaceEvent::CloseRequested => {
                    info!("Render surface closed");
                    return LoopAction::Stop;
                }
            }
        }

        let screen = mailbox.take_screen_requests();
        if screen.full_screen {
            surface.set_full_screen(true);
        } else if screen.restore {
            surface.set_full_screen(false);
        }

        if let Some(cloud) = mailbox.wait_for_cloud(RENDER_WAIT_TIMEOUT) {
            surface.render(&cloud);
            current = Some(cloud);
        }

        LoopAction::Continue
    })
}

/// Copy the displayed cloud and write it off-thread
fn save_snapshot(current: Option<&PointCloud>, folder: &PathBuf) {
    let Some(cloud) = current else {
        warn!("Snapshot requested with no cloud displayed");
        return;
    };

    let copy = cloud.clone();
    let folder = folder.clone();
    thread::spawn(move || match save_point_cloud(&folder, SNAPSHOT_PREFIX, &copy) {
        Ok(path) => info!(path = %path.display(), "Snapshot written"),
        Err(e) => warn!(error = %e, "Snapshot failed"),
    });
}
