// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-capacity frame slot pool
//!
//! Moves raw camera frames from the caller's thread into the builder
//! thread without per-poll copies or unbounded queueing. Exactly one
//! producer and one consumer operate on the pool concurrently.
//!
//! Two delivery semantics:
//! - **FIFO**: every committed frame is read in submission order.
//! - **Latest-wins**: the consumer always starts from the newest ready
//!   slot; with overwrite allowed the producer may reuse unread slots,
//!   without overwrite stale ready slots are invalidated at read time.
//!   This is the mode used for live display, where rendering a frame
//!   from two cycles ago is worse than dropping one.
//!
//! Slot state machine: Idle -> Writing -> Ready -> Reading -> Idle.
//! Cursor and state updates happen under one mutex; pixel data lives
//! behind a per-slot mutex that is uncontended once a slot is held in
//! Writing or Reading state.

use crate::config::{CameraIntrinsics, FilterParameters};
use crate::errors::{PipelineError, PipelineResult, SubmitError};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Lifecycle state of one frame slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Free for the producer
    Idle,
    /// Held by the producer
    Writing,
    /// Committed, waiting for the consumer
    Ready,
    /// Held by the consumer
    Reading,
}

/// One frame submitted by the caller, borrowed for the copy into a slot
///
/// `disparity` must already be resampled to the image dimensions; the
/// pool never rescales. `disparity_color` is an optional pre-rendered
/// RGBA visualization of the disparity map, carried opaquely for the
/// embedding GUI.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub image: &'a [u8],
    pub disparity: &'a [f32],
    pub disparity_color: Option<&'a [u8]>,
    pub intrinsics: CameraIntrinsics,
    pub filters: FilterParameters,
}

/// Pixel data and per-frame settings of one pool slot
///
/// Buffers are allocated once at pool initialization for the pool's
/// maximum dimensions and reused for every frame thereafter.
#[derive(Debug)]
pub struct FrameSlot {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub image: Vec<u8>,
    pub disparity: Vec<f32>,
    pub disparity_color: Vec<u8>,
    pub intrinsics: CameraIntrinsics,
    pub filters: FilterParameters,
    pub timestamp: u64,
}

impl FrameSlot {
    fn allocate(width: usize, height: usize) -> Self {
        let pixels = width * height;
        Self {
            width,
            height,
            channels: 1,
            image: vec![0u8; pixels * 4],
            disparity: vec![0.0f32; pixels],
            disparity_color: vec![0u8; pixels * 4],
            intrinsics: CameraIntrinsics::default(),
            filters: FilterParameters::default(),
            timestamp: 0,
        }
    }
}

struct PoolCursors {
    states: Vec<SlotState>,
    times: Vec<u64>,
    next_write: usize,
    next_read: usize,
    last_put: usize,
    last_get: usize,
    latest_wins: bool,
    allow_overwrite: bool,
}

/// Single-producer / single-consumer frame pool
pub struct FramePool {
    cursors: Mutex<PoolCursors>,
    slots: Vec<Mutex<FrameSlot>>,
    capacity: usize,
    width: usize,
    height: usize,
}

impl FramePool {
    /// Allocate `capacity` slots of `width * height` pixels
    ///
    /// All buffers are sized here, once, for the life of the pool.
    pub fn new(
        capacity: usize,
        width: usize,
        height: usize,
        latest_wins: bool,
        allow_overwrite: bool,
    ) -> PipelineResult<Self> {
        if width * height == 0 {
            return Err(PipelineError::InvalidDimensions { width, height });
        }
        if capacity == 0 {
            return Err(PipelineError::InvalidCapacity(capacity));
        }

        let slots = (0..capacity)
            .map(|_| Mutex::new(FrameSlot::allocate(width, height)))
            .collect();

        Ok(Self {
            cursors: Mutex::new(PoolCursors {
                states: vec![SlotState::Idle; capacity],
                times: vec![0; capacity],
                next_write: 0,
                next_read: 0,
                last_put: 0,
                last_get: 0,
                latest_wins,
                allow_overwrite,
            }),
            slots,
            capacity,
            width,
            height,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Switch delivery semantics; intended for use between sessions
    pub fn set_mode(&self, latest_wins: bool, allow_overwrite: bool) {
        let mut cursors = self.cursors.lock().unwrap();
        cursors.latest_wins = latest_wins;
        cursors.allow_overwrite = allow_overwrite;
    }

    /// Claim the slot at the write cursor for the producer
    ///
    /// Fails when the consumer holds that slot, or — without overwrite —
    /// when it is not idle. On success the slot is `Writing` and `now`
    /// is recorded as its submission timestamp.
    pub fn acquire_for_write(&self, now: u64) -> Option<usize> {
        let mut cursors = self.cursors.lock().unwrap();
        let index = cursors.next_write;

        if cursors.states[index] == SlotState::Reading {
            return None;
        }
        if !cursors.allow_overwrite && cursors.states[index] != SlotState::Idle {
            return None;
        }

        cursors.states[index] = SlotState::Writing;
        cursors.times[index] = now;
        cursors.last_put = index;
        Some(index)
    }

    /// Copy a frame into a slot previously acquired for writing
    pub fn write_frame(&self, index: usize, frame: &FrameInput<'_>) -> Result<(), SubmitError> {
        if index >= self.capacity {
            return Err(SubmitError::InvalidFrame(format!(
                "slot index {} out of range",
                index
            )));
        }
        let pixels = frame.width * frame.height;
        if pixels == 0 || !matches!(frame.channels, 1 | 3 | 4) {
            return Err(SubmitError::InvalidFrame(format!(
                "bad dimensions {}x{}x{}",
                frame.width, frame.height, frame.channels
            )));
        }
        if pixels > self.width * self.height {
            return Err(SubmitError::InvalidFrame(format!(
                "frame {}x{} exceeds pool dimensions {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        if frame.image.len() < pixels * frame.channels || frame.disparity.len() < pixels {
            return Err(SubmitError::InvalidFrame(
                "image or disparity buffer shorter than stated dimensions".to_string(),
            ));
        }

        let mut slot = self.slots[index].lock().unwrap();
        slot.width = frame.width;
        slot.height = frame.height;
        slot.channels = frame.channels;
        slot.image[..pixels * frame.channels]
            .copy_from_slice(&frame.image[..pixels * frame.channels]);
        slot.disparity[..pixels].copy_from_slice(&frame.disparity[..pixels]);
        if let Some(colored) = frame.disparity_color {
            let len = (pixels * 4).min(colored.len());
            slot.disparity_color[..len].copy_from_slice(&colored[..len]);
        }
        slot.intrinsics = frame.intrinsics;
        slot.filters = frame.filters;
        Ok(())
    }

    /// Finish a write: `valid == false` discards the data and frees the
    /// slot; `valid == true` publishes it for the consumer.
    pub fn commit_write(&self, index: usize, valid: bool) {
        let mut cursors = self.cursors.lock().unwrap();

        if index >= self.capacity || index != cursors.last_put {
            // Acquire and commit must pair one-to-one on the producer
            warn!(index, "commit_write with mismatched slot index, ignored");
            return;
        }
        if cursors.states[index] != SlotState::Writing {
            warn!(
                index,
                state = ?cursors.states[index],
                "commit_write on a slot not held for writing, ignored"
            );
            return;
        }

        if !valid {
            cursors.states[index] = SlotState::Idle;
            return;
        }

        cursors.states[index] = SlotState::Ready;
        if cursors.latest_wins {
            // Consumer always starts from the newest committed frame
            cursors.next_read = index;
        }
        cursors.next_write = (index + 1) % self.capacity;
    }

    /// Claim the slot at the read cursor for the consumer
    ///
    /// Returns the slot index and its submission timestamp. In
    /// latest-wins mode without overwrite, older contiguous ready slots
    /// are invalidated so stale frames are never consumed later.
    pub fn acquire_for_read(&self) -> Option<(usize, u64)> {
        let mut cursors = self.cursors.lock().unwrap();
        let index = cursors.next_read;

        if cursors.states[index] != SlotState::Ready {
            return None;
        }

        cursors.states[index] = SlotState::Reading;
        cursors.last_get = index;
        let timestamp = cursors.times[index];

        if cursors.latest_wins {
            if !cursors.allow_overwrite {
                // Walk backward from the newest slot, retiring stale frames
                let mut j = (index + self.capacity - 1) % self.capacity;
                while j != index && cursors.states[j] == SlotState::Ready {
                    cursors.states[j] = SlotState::Idle;
                    j = (j + self.capacity - 1) % self.capacity;
                }
            }
        } else {
            cursors.next_read = (index + 1) % self.capacity;
        }

        Some((index, timestamp))
    }

    /// Borrow the pixel data of a slot
    ///
    /// Intended for the stage currently holding the slot (`Writing` or
    /// `Reading`); the per-slot mutex is uncontended in that case.
    pub fn slot(&self, index: usize) -> MutexGuard<'_, FrameSlot> {
        self.slots[index].lock().unwrap()
    }

    /// Return a slot claimed by `acquire_for_read` to the pool
    pub fn release_read(&self, index: usize) {
        let mut cursors = self.cursors.lock().unwrap();

        if index >= self.capacity || index != cursors.last_get {
            // Acquire and release must pair one-to-one on the consumer
            warn!(index, "release_read with mismatched slot index, ignored");
            return;
        }
        if cursors.states[index] != SlotState::Reading {
            warn!(
                index,
                state = ?cursors.states[index],
                "release_read on a slot not held for reading, ignored"
            );
            return;
        }

        cursors.states[index] = SlotState::Idle;
    }

    /// Return every slot to idle and clear the cursors
    ///
    /// Used when (re)starting a capture session.
    pub fn reset(&self) {
        let mut cursors = self.cursors.lock().unwrap();
        for state in cursors.states.iter_mut() {
            *state = SlotState::Idle;
        }
        for time in cursors.times.iter_mut() {
            *time = 0;
        }
        cursors.next_write = 0;
        cursors.next_read = 0;
        cursors.last_put = 0;
        cursors.last_get = 0;
    }

    /// Convenience for the producer: acquire, copy, commit in one call
    pub fn put(&self, frame: &FrameInput<'_>, now: u64) -> Result<(), SubmitError> {
        let index = self.acquire_for_write(now).ok_or(SubmitError::PoolFull)?;
        match self.write_frame(index, frame) {
            Ok(()) => {
                self.commit_write(index, true);
                Ok(())
            }
            Err(e) => {
                self.commit_write(index, false);
                Err(e)
            }
        }
    }

    #[cfg(test)]
    fn state_of(&self, index: usize) -> SlotState {
        self.cursors.lock().unwrap().states[index]
    }
}
