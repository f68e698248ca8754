// SPDX-License-Identifier: GPL-3.0-only

//! One in-flight computational capture
//!
//! The session is the only thing the stream callback touches. It appends
//! frames, publishes progress and signals the pipeline once collection has
//! ended for any reason.

use super::state::{CaptureStateMachine, CaptureStatus};
use crate::backends::camera::types::{CameraFrame, FrameCallback};
use crate::constants::MAX_FRAME_COUNT;
use crate::sync::lock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why collection stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEnd {
    /// Exactly `frame_count` frames arrived
    Complete,
    /// The cancel flag was seen at a frame append
    Cancelled,
    /// The stream dropped the callback early
    Interrupted,
}

struct Collector {
    frames: Vec<CameraFrame>,
    end: Option<oneshot::Sender<CollectionEnd>>,
}

/// Frames and control flags of one capture attempt
pub struct CaptureSession {
    id: Uuid,
    frame_count: u32,
    collector: Mutex<Collector>,
    cancelled: AtomicBool,
    machine: Arc<Mutex<CaptureStateMachine>>,
}

impl CaptureSession {
    /// New session expecting `frame_count` frames
    ///
    /// The receiver resolves once collection ends. It errors only if the
    /// session is dropped without ever ending.
    pub fn new(
        frame_count: u32,
        machine: Arc<Mutex<CaptureStateMachine>>,
    ) -> (Arc<Self>, oneshot::Receiver<CollectionEnd>) {
        let (end, receiver) = oneshot::channel();
        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            frame_count,
            collector: Mutex::new(Collector {
                frames: Vec::with_capacity(frame_count.min(MAX_FRAME_COUNT) as usize),
                end: Some(end),
            }),
            cancelled: AtomicBool::new(false),
            machine,
        });
        (session, receiver)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Frames collected so far
    pub fn collected(&self) -> usize {
        lock(&self.collector).frames.len()
    }

    /// Request cooperative cancellation, honoured at the next frame
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether collection has already ended
    pub fn is_closed(&self) -> bool {
        lock(&self.collector).end.is_none()
    }

    /// Append a frame delivered by the stream
    pub fn push_frame(&self, frame: CameraFrame) {
        let mut collector = lock(&self.collector);
        if collector.end.is_none() {
            return;
        }

        if self.cancelled.load(Ordering::SeqCst) {
            info!(session = %self.id, collected = collector.frames.len(), "Capture cancelled");
            self.close(&mut collector, CollectionEnd::Cancelled);
            return;
        }

        collector.frames.push(frame);
        let collected = collector.frames.len();
        let progress = collected as f32 / self.frame_count as f32;
        lock(&self.machine).set_progress(progress);

        if collected >= self.frame_count as usize {
            debug!(session = %self.id, collected, "All frames collected");
            self.close(&mut collector, CollectionEnd::Complete);
        }
    }

    /// End collection because the stream went away
    pub fn interrupt(&self) {
        let mut collector = lock(&self.collector);
        if collector.end.is_some() {
            warn!(
                session = %self.id,
                collected = collector.frames.len(),
                expected = self.frame_count,
                "Frame stream ended before collection finished"
            );
            self.close(&mut collector, CollectionEnd::Interrupted);
        }
    }

    /// Move the collected frames out, leaving the session empty
    pub fn take_frames(&self) -> Vec<CameraFrame> {
        std::mem::take(&mut lock(&self.collector).frames)
    }

    fn close(&self, collector: &mut Collector, reason: CollectionEnd) {
        {
            let mut machine = lock(&self.machine);
            if *machine.status() == CaptureStatus::Collecting {
                machine.finalize();
            }
        }
        if let Some(end) = collector.end.take() {
            let _ = end.send(reason);
        }
    }

    /// Stream callback feeding this session
    ///
    /// When the device drops the callback before collection ended, the
    /// session is interrupted.
    pub fn frame_callback(self: &Arc<Self>) -> FrameCallback {
        let guard = StreamGuard(Arc::clone(self));
        Arc::new(move |frame| guard.0.push_frame(frame))
    }
}

struct StreamGuard(Arc<CaptureSession>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.interrupt();
    }
}
