// SPDX-License-Identifier: GPL-3.0-only

//! Exposure strategy decision
//!
//! A request either fits into one hardware exposure or gets synthesized from
//! a run of stream frames at the device's longest per-frame exposure.

use crate::backends::camera::types::{DeviceCapabilities, ExposureDuration};
use crate::constants::{MAX_FRAME_COUNT, NOMINAL_FPS};
use crate::errors::CaptureError;
use std::cmp::Ordering;
use tracing::debug;

/// A requested exposure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    target_duration_seconds: f64,
    iso_hint: f32,
}

impl CaptureRequest {
    /// Validate and build a request
    pub fn new(target_duration_seconds: f64, iso_hint: f32) -> Result<Self, CaptureError> {
        if !target_duration_seconds.is_finite() || target_duration_seconds <= 0.0 {
            return Err(CaptureError::InvalidRequest(format!(
                "exposure duration must be positive, got {}",
                target_duration_seconds
            )));
        }
        Ok(Self {
            target_duration_seconds,
            iso_hint,
        })
    }

    pub fn target_duration_seconds(&self) -> f64 {
        self.target_duration_seconds
    }

    pub fn iso_hint(&self) -> f32 {
        self.iso_hint
    }

    pub fn target_duration(&self) -> ExposureDuration {
        ExposureDuration::from_secs_f64(self.target_duration_seconds)
    }
}

/// How a request will be captured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExposurePlan {
    /// One hardware exposure of the full duration
    Hardware { duration: ExposureDuration, iso: f32 },
    /// Average of `frame_count` stream frames
    Computational {
        frame_count: u32,
        per_frame_duration: ExposureDuration,
        iso: f32,
        fps: f64,
    },
}

impl ExposurePlan {
    pub fn is_hardware(&self) -> bool {
        matches!(self, ExposurePlan::Hardware { .. })
    }

    pub fn iso(&self) -> f32 {
        match self {
            ExposurePlan::Hardware { iso, .. } | ExposurePlan::Computational { iso, .. } => *iso,
        }
    }
}

impl std::fmt::Display for ExposurePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExposurePlan::Hardware { duration, iso } => {
                write!(f, "hardware exposure {} at ISO {:.0}", duration, iso)
            }
            ExposurePlan::Computational {
                frame_count,
                per_frame_duration,
                iso,
                fps,
            } => write!(
                f,
                "{} frames of {} at ISO {:.0} ({} fps nominal)",
                frame_count, per_frame_duration, iso, fps
            ),
        }
    }
}

/// Decide how to capture `request` given the active capability envelope
///
/// `fps` is the nominal stream rate; non-positive values fall back to
/// [`NOMINAL_FPS`]. Requests needing more than [`MAX_FRAME_COUNT`] frames
/// are rejected.
pub fn plan(
    request: &CaptureRequest,
    caps: &DeviceCapabilities,
    fps: f64,
) -> Result<ExposurePlan, CaptureError> {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        NOMINAL_FPS
    };
    let target = request.target_duration();
    let iso = caps.clamp_iso(request.iso_hint());

    if target.cmp_exact(&caps.max_exposure_duration) != Ordering::Greater {
        debug!(%target, iso, "Target fits in one hardware exposure");
        return Ok(ExposurePlan::Hardware {
            duration: target,
            iso,
        });
    }

    let frames = (request.target_duration_seconds() * fps).floor();
    if frames > f64::from(MAX_FRAME_COUNT) {
        return Err(CaptureError::InvalidRequest(format!(
            "{:.0} frames needed at {} fps, at most {} supported",
            frames, fps, MAX_FRAME_COUNT
        )));
    }
    let frame_count = frames as u32;
    if frame_count == 0 {
        return Ok(ExposurePlan::Hardware {
            duration: target,
            iso,
        });
    }

    let frame_interval = ExposureDuration::from_secs_f64(1.0 / fps);
    let per_frame_duration = max_duration(frame_interval, caps.max_exposure_duration);
    let per_frame_duration = min_duration(per_frame_duration, caps.max_exposure_duration);

    debug!(frame_count, %per_frame_duration, iso, fps, "Computational exposure planned");

    Ok(ExposurePlan::Computational {
        frame_count,
        per_frame_duration,
        iso,
        fps,
    })
}

fn max_duration(a: ExposureDuration, b: ExposureDuration) -> ExposureDuration {
    if a.cmp_exact(&b) == Ordering::Less { b } else { a }
}

fn min_duration(a: ExposureDuration, b: ExposureDuration) -> ExposureDuration {
    if a.cmp_exact(&b) == Ordering::Greater { b } else { a }
}
