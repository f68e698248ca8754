// SPDX-License-Identifier: MPL-2.0

//! Single hardware exposures
//!
//! Short exposures that fit inside the device envelope are taken as one
//! still instead of being synthesized from stream frames.

use crate::backends::camera::ControlQueue;
use crate::backends::camera::types::{BackendResult, CameraFrame, HardwareExposure};
use futures::future::BoxFuture;
use tracing::{debug, info};

/// Seam for taking one still with fixed exposure settings
///
/// Implementations must leave the device in auto exposure afterwards,
/// whether or not the capture succeeded.
pub trait PhotoCaptureAdapter: Send + Sync {
    fn capture_once(&self, settings: HardwareExposure) -> BoxFuture<'_, BackendResult<CameraFrame>>;
}

/// Captures through the serialized control queue
#[derive(Clone)]
pub struct ControlQueueCapture {
    control: ControlQueue,
}

impl ControlQueueCapture {
    pub fn new(control: ControlQueue) -> Self {
        Self { control }
    }
}

impl PhotoCaptureAdapter for ControlQueueCapture {
    fn capture_once(&self, settings: HardwareExposure) -> BoxFuture<'_, BackendResult<CameraFrame>> {
        Box::pin(async move {
            info!(
                duration = %settings.duration,
                iso = settings.iso,
                "Capturing single hardware exposure"
            );

            let frame = self.control.capture_photo(settings).await?;

            debug!(
                width = frame.width,
                height = frame.height,
                "Frame captured from device"
            );
            Ok(frame)
        })
    }
}
