// SPDX-License-Identifier: GPL-3.0-only
//! Paced frame stream thread
//!
//! Drives a device's frame stream at a fixed cadence on its own thread. The
//! thread is the "stream context": every frame callback runs on it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Action returned by the tick callback to control the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep streaming
    Continue,
    /// Stop the stream gracefully
    Stop,
}

/// Controller for a paced stream thread
///
/// # Example
///
/// ```
/// use long_exposure::backends::camera::frame_loop::{LoopAction, StreamLoopController};
/// use std::time::Duration;
///
/// let mut controller = StreamLoopController::start("ticker", Duration::from_millis(1), |sequence| {
///     if sequence < 3 {
///         LoopAction::Continue
///     } else {
///         LoopAction::Stop
///     }
/// });
///
/// controller.stop();
/// assert!(!controller.is_running());
/// ```
pub struct StreamLoopController {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl StreamLoopController {
    /// Start calling `tick_fn` every `interval` on a new thread
    ///
    /// The callback receives the zero-based tick sequence number. Ticks are
    /// scheduled against absolute deadlines; a slow tick delays the next
    /// one instead of bunching frames up.
    pub fn start<F>(name: &str, interval: Duration, mut tick_fn: F) -> Self
    where
        F: FnMut(u64) -> LoopAction + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop_signal);
        let thread_name = name.to_string();

        info!(name = %name, interval_ms = interval.as_millis() as u64, "Starting stream loop");

        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut sequence = 0u64;
                let mut deadline = Instant::now();

                loop {
                    if thread_stop.load(Ordering::SeqCst) {
                        debug!(name = %thread_name, "Stop signal received");
                        break;
                    }

                    if tick_fn(sequence) == LoopAction::Stop {
                        debug!(name = %thread_name, "Stream requested stop");
                        break;
                    }
                    sequence += 1;

                    deadline += interval;
                    let now = Instant::now();
                    if deadline > now {
                        thread::sleep(deadline - now);
                    } else {
                        deadline = now;
                    }
                }

                info!(name = %thread_name, frames = sequence, "Stream loop exiting");
            });

        let thread_handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(name = %name, error = %e, "Failed to spawn stream thread");
                None
            }
        };

        Self {
            thread_handle,
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the stream thread is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop without waiting
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting stream loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        if let Some(handle) = self.thread_handle.take() {
            // A callback may itself be stopping the stream from this thread
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Stream thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for StreamLoopController {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.stop();
        }
    }
}
