// SPDX-License-Identifier: GPL-3.0-only

//! Capture lifecycle state
//!
//! Status and progress only change through [`CaptureStateMachine`]. Every
//! change is published as a [`CaptureSnapshot`] on a watch channel so
//! observers on any thread get consistent read-only copies.

use crate::errors::CaptureError;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Lifecycle stage of a computational capture
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureStatus {
    #[default]
    Idle,
    /// Locking the device and applying exposure settings
    Configuring,
    /// Receiving frames from the stream
    Collecting,
    /// Restoring the device and compositing
    Finalizing,
    Done,
    Failed(CaptureError),
}

impl CaptureStatus {
    /// A capture is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            CaptureStatus::Configuring | CaptureStatus::Collecting | CaptureStatus::Finalizing
        )
    }

    /// Allowed edges of the lifecycle graph
    ///
    /// `Done` and `Failed` are resting states; leaving them starts a new
    /// lifecycle at `Configuring`.
    pub fn can_transition_to(&self, next: &CaptureStatus) -> bool {
        use CaptureStatus::*;
        matches!(
            (self, next),
            (Idle | Done | Failed(_), Configuring)
                | (Configuring, Collecting)
                | (Configuring, Failed(_))
                | (Collecting, Finalizing)
                | (Finalizing, Done)
                | (Finalizing, Failed(_))
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            CaptureStatus::Idle => "idle",
            CaptureStatus::Configuring => "configuring",
            CaptureStatus::Collecting => "collecting",
            CaptureStatus::Finalizing => "finalizing",
            CaptureStatus::Done => "done",
            CaptureStatus::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureStatus::Failed(reason) => write!(f, "failed ({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// What observers see
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureSnapshot {
    pub status: CaptureStatus,
    /// Fraction of frames collected, in `[0, 1]`
    pub progress: f32,
}

/// Owner of the published capture state
#[derive(Debug)]
pub struct CaptureStateMachine {
    current: CaptureSnapshot,
    publisher: watch::Sender<CaptureSnapshot>,
}

impl CaptureStateMachine {
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(CaptureSnapshot::default());
        Self {
            current: CaptureSnapshot::default(),
            publisher,
        }
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        self.current.clone()
    }

    pub fn status(&self) -> &CaptureStatus {
        &self.current.status
    }

    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.publisher.subscribe()
    }

    /// Start a new lifecycle
    ///
    /// Fails with [`CaptureError::Busy`] while another one is in flight.
    pub fn begin(&mut self) -> Result<(), CaptureError> {
        if self.current.status.is_busy() {
            return Err(CaptureError::Busy);
        }
        self.current.progress = 0.0;
        self.transition(CaptureStatus::Configuring);
        Ok(())
    }

    /// Move to `next` if the lifecycle allows it
    ///
    /// Returns false and leaves the state untouched otherwise.
    pub fn transition(&mut self, next: CaptureStatus) -> bool {
        if !self.current.status.can_transition_to(&next) {
            warn!(
                from = %self.current.status,
                to = %next,
                "Rejected capture status transition"
            );
            return false;
        }
        debug!(from = %self.current.status, to = %next, "Capture status changed");
        self.current.status = next;
        if self.current.status == CaptureStatus::Done {
            self.current.progress = 1.0;
        }
        self.publish();
        true
    }

    /// Enter `Finalizing` unless already there
    pub fn finalize(&mut self) {
        if self.current.status != CaptureStatus::Finalizing {
            self.transition(CaptureStatus::Finalizing);
        }
    }

    /// Publish collection progress
    ///
    /// Ignored outside `Collecting`. Progress never decreases.
    pub fn set_progress(&mut self, progress: f32) {
        if self.current.status != CaptureStatus::Collecting {
            return;
        }
        let progress = progress.clamp(0.0, 1.0);
        if progress > self.current.progress {
            self.current.progress = progress;
            self.publish();
        }
    }

    fn publish(&self) {
        self.publisher.send_replace(self.current.clone());
    }
}

impl Default for CaptureStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
