// SPDX-License-Identifier: GPL-3.0-only

//! Single-item cloud mailbox
//!
//! Holds at most one point cloud: the most recent one the builder
//! finished. Publishing overwrites an unconsumed cloud; the renderer
//! waits with a bounded timeout and takes ownership of whatever is
//! there. A counting signal capped at one plays the role of a binary
//! semaphore, so a burst of publishes wakes the renderer exactly once.
//!
//! Two one-shot view-control flags (full-screen / restore) ride along
//! under the same mutex and are consumed exactly once by the renderer.

use crate::cloud::PointCloud;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Default)]
struct MailboxState {
    cloud: Option<PointCloud>,
    available: u32,
    full_screen_request: bool,
    restore_screen_request: bool,
}

/// One-shot screen requests taken by the renderer each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenRequest {
    pub full_screen: bool,
    pub restore: bool,
}

/// Mutex + condvar mailbox between builder and renderer
#[derive(Default)]
pub struct CloudMailbox {
    state: Mutex<MailboxState>,
    signal: Condvar,
}

impl CloudMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a finished cloud in, replacing any unconsumed one
    pub fn publish(&self, cloud: PointCloud) {
        let mut state = self.state.lock().unwrap();
        state.cloud = Some(cloud);
        state.available = 1;
        drop(state);
        self.signal.notify_one();
    }

    /// Wait up to `timeout` for a cloud and take ownership of it
    ///
    /// Returns `None` on timeout; the caller redraws with its previous
    /// cloud and comes back next refresh.
    pub fn wait_for_cloud(&self, timeout: Duration) -> Option<PointCloud> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        while state.available == 0 {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (next, result) = self.signal.wait_timeout(state, deadline - now).unwrap();
            state = next;
            if result.timed_out() && state.available == 0 {
                return None;
            }
        }
        state.available = 0;
        // Cloud moves out before the lock is dropped; rendering happens
        // without any lock held
        state.cloud.take()
    }

    /// Take the cloud if one is pending, without blocking
    pub fn try_take(&self) -> Option<PointCloud> {
        let mut state = self.state.lock().unwrap();
        if state.available == 0 {
            return None;
        }
        state.available = 0;
        state.cloud.take()
    }

    /// Queue a one-shot screen change for the renderer
    ///
    /// `enabled == true` requests full-screen; `false` requests a
    /// restore of the original view size.
    pub fn request_full_screen(&self, enabled: bool) {
        let mut state = self.state.lock().unwrap();
        if enabled {
            state.full_screen_request = true;
        } else {
            state.full_screen_request = false;
            state.restore_screen_request = true;
        }
    }

    /// Consume the pending screen requests (cleared on return)
    pub fn take_screen_requests(&self) -> ScreenRequest {
        let mut state = self.state.lock().unwrap();
        let request = ScreenRequest {
            full_screen: state.full_screen_request,
            restore: state.restore_screen_request,
        };
        state.full_screen_request = false;
        state.restore_screen_request = false;
        request
    }

    /// Drop any pending cloud and flags; used when restarting
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        *state = MailboxState::default();
    }
}
