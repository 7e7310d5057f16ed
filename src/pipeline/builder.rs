// SPDX-License-Identifier: GPL-3.0-only

//! Point cloud builder worker
//!
//! Pulls the newest available frame from the pool, reprojects it into a
//! colored cloud, runs the frame's own filter chain, and publishes the
//! result to the mailbox. When the pool is empty it sleeps for one
//! refresh period and retries, so the stop flag is observed promptly.

use super::worker::{LoopAction, WorkerControl};
use crate::cloud::filters::{apply_chain, stages_for};
use crate::cloud::{FrameView, PointCloud, build_point_cloud};
use crate::constants::BUILDER_POLL_INTERVAL;
use crate::mailbox::CloudMailbox;
use crate::pool::{FramePool, FrameSlot};
use std::sync::Arc;
use std::thread;
use tracing::{trace, warn};

/// Spawn the builder loop
pub(crate) fn spawn_builder(pool: Arc<FramePool>, mailbox: Arc<CloudMailbox>) -> WorkerControl {
    WorkerControl::spawn("cloud-builder", move || {
        let Some((index, timestamp)) = pool.acquire_for_read() else {
            thread::sleep(BUILDER_POLL_INTERVAL);
            return LoopAction::Continue;
        };

        let cloud = {
            let slot = pool.slot(index);
            process_frame(&slot)
        };
        pool.release_read(index);

        if let Some(cloud) = cloud {
            trace!(
                timestamp,
                points = cloud.len(),
                valid = cloud.valid_count(),
                "Cloud built"
            );
            mailbox.publish(cloud);
        }

        LoopAction::Continue
    })
}

/// Reproject one frame and run its filter chain
///
/// A frame with empty or undersized buffers is skipped with a warning;
/// the loop continues with the next frame.
fn process_frame(slot: &FrameSlot) -> Option<PointCloud> {
    let view = FrameView {
        width: slot.width,
        height: slot.height,
        channels: slot.channels,
        image: &slot.image,
        disparity: &slot.disparity,
    };

    if !view.is_complete() {
        warn!(
            width = slot.width,
            height = slot.height,
            channels = slot.channels,
            "Skipping frame with incomplete buffers"
        );
        return None;
    }

    let cloud = build_point_cloud(&view, &slot.intrinsics);
    let stages = stages_for(&slot.filters);
    Some(apply_chain(cloud, &stages))
}
