// SPDX-License-Identifier: GPL-3.0-only

//! Worker thread lifecycle
//!
//! Both pipeline workers (builder and renderer) run through the same
//! controller: a loop closure invoked until it asks to stop or the
//! cooperative stop flag is raised. Shutdown is bounded — the controller
//! polls the worker's done flag for a fixed window and abandons the
//! handle if the worker never exits, so `stop` can never hang the caller.

use crate::constants::{SHUTDOWN_POLL_INTERVAL, SHUTDOWN_TIMEOUT};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by a worker loop closure to control loop behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Run another iteration
    Continue,
    /// Exit the loop gracefully
    Stop,
}

/// Controller for one worker loop running in its own thread
pub struct WorkerControl {
    handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
    name: String,
}

impl WorkerControl {
    /// Spawn a worker that calls `loop_fn` until it returns
    /// `LoopAction::Stop` or a stop is requested
    pub fn spawn<F>(name: &str, mut loop_fn: F) -> Self
    where
        F: FnMut() -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let done = Arc::new(AtomicBool::new(false));
        let stop_in_thread = Arc::clone(&stop_signal);
        let done_in_thread = Arc::clone(&done);
        let thread_name = name.to_string();

        info!(name = %name, "Starting worker loop");

        let handle = thread::spawn(move || {
            debug!(name = %thread_name, "Worker thread started");

            loop {
                // Stop flag is checked every iteration, so no wait
                // inside loop_fn may be unbounded
                if stop_in_thread.load(Ordering::SeqCst) {
                    debug!(name = %thread_name, "Stop signal received");
                    break;
                }

                match loop_fn() {
                    LoopAction::Continue => {}
                    LoopAction::Stop => {
                        debug!(name = %thread_name, "Loop requested stop");
                        break;
                    }
                }
            }

            done_in_thread.store(true, Ordering::SeqCst);
            info!(name = %thread_name, "Worker thread exiting");
        });

        Self {
            handle: Some(handle),
            stop_signal,
            done,
            name: name.to_string(),
        }
    }

    /// Whether the worker thread is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Raise the cooperative stop flag without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting worker stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Request stop and wait up to `timeout` for the worker to finish
    ///
    /// Polls the done flag every few milliseconds. Returns `true` when
    /// the thread was joined; `false` when the timeout elapsed and the
    /// handle was abandoned. Either way the call returns within the
    /// timeout plus one poll interval.
    pub fn stop_with_timeout(&mut self, timeout: Duration) -> bool {
        self.request_stop();

        let deadline = Instant::now() + timeout;
        while !self.done.load(Ordering::SeqCst) {
            if Instant::now() >= deadline {
                warn!(
                    name = %self.name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Worker did not stop within the timeout, abandoning handle"
                );
                self.handle.take();
                return false;
            }
            thread::sleep(SHUTDOWN_POLL_INTERVAL);
        }

        self.join();
        true
    }

    /// Wait for the thread to finish without raising the stop flag
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(name = %self.name, "Waiting for worker thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Worker thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Worker thread finished");
            }
        }
    }
}

impl Drop for WorkerControl {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!(name = %self.name, "WorkerControl dropped, stopping loop");
            self.stop_with_timeout(SHUTDOWN_TIMEOUT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_loop_stops_itself() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_in_loop = Arc::clone(&counter);

        let mut worker = WorkerControl::spawn("test-loop", move || {
            let count = counter_in_loop.fetch_add(1, Ordering::SeqCst);
            if count >= 10 {
                LoopAction::Stop
            } else {
                LoopAction::Continue
            }
        });

        worker.join();
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_stop_signal() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_in_loop = Arc::clone(&counter);

        let mut worker = WorkerControl::spawn("test-stop", move || {
            counter_in_loop.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            LoopAction::Continue
        });

        thread::sleep(Duration::from_millis(30));
        assert!(worker.stop_with_timeout(Duration::from_secs(2)));
        assert!(counter.load(Ordering::SeqCst) > 0);
        assert!(!worker.is_running());
    }

    #[test]
    fn test_stop_with_timeout_bounds_unresponsive_worker() {
        // A worker that ignores the stop flag for a long time
        let mut worker = WorkerControl::spawn("test-stuck", move || {
            thread::sleep(Duration::from_secs(10));
            LoopAction::Continue
        });

        let start = Instant::now();
        let stopped = worker.stop_with_timeout(Duration::from_millis(100));
        assert!(!stopped);
        assert!(start.elapsed() < Duration::from_secs(1));
        // Handle abandoned; drop must not block either
        drop(worker);
    }

    #[test]
    fn test_is_running() {
        let worker = WorkerControl::spawn("test-running", || {
            thread::sleep(Duration::from_millis(50));
            LoopAction::Continue
        });
        assert!(worker.is_running());
        drop(worker);
    }
}
