// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for capture devices

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Framerate as a fraction (numerator/denominator)
/// Stores exact framerate to handle NTSC rates like 59.94fps (60000/1001)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate from numerator and denominator
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Create a framerate from an integer (e.g., 30 becomes 30/1)
    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    /// Get the framerate as a floating point value
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Interval between two frames at this rate
    pub fn frame_interval(&self) -> std::time::Duration {
        if self.num == 0 {
            return std::time::Duration::ZERO;
        }
        std::time::Duration::from_secs_f64(self.denom as f64 / self.num as f64)
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

/// Exposure duration as rational seconds (numerator/denominator)
///
/// Devices report shutter limits as fractions such as 1/8000 s or 1/3 s;
/// keeping them rational avoids drift when comparing against device limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExposureDuration {
    pub num: u64,
    pub denom: u32,
}

impl ExposureDuration {
    /// Timescale used when converting from floating point seconds
    pub const DEFAULT_TIMESCALE: u32 = 1_000_000;

    /// Create a new duration from numerator and denominator
    pub fn new(num: u64, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Whole seconds
    pub fn from_secs(secs: u64) -> Self {
        Self { num: secs, denom: 1 }
    }

    /// Convert from floating point seconds at microsecond resolution
    ///
    /// Negative and non-finite inputs become zero.
    pub fn from_secs_f64(secs: f64) -> Self {
        if !secs.is_finite() || secs <= 0.0 {
            return Self::new(0, Self::DEFAULT_TIMESCALE);
        }
        let num = (secs * Self::DEFAULT_TIMESCALE as f64).round() as u64;
        Self::new(num, Self::DEFAULT_TIMESCALE)
    }

    /// Duration in seconds
    pub fn as_secs_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Convert to a std duration (for sleeps and timers)
    pub fn to_std(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.as_secs_f64())
    }

    /// Exact comparison without going through floating point
    pub fn cmp_exact(&self, other: &Self) -> std::cmp::Ordering {
        let lhs = self.num as u128 * other.denom as u128;
        let rhs = other.num as u128 * self.denom as u128;
        lhs.cmp(&rhs)
    }
}

impl std::fmt::Display for ExposureDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let secs = self.as_secs_f64();
        if secs > 0.0 && secs < 1.0 && self.num == 1 {
            write!(f, "1/{}s", self.denom)
        } else {
            write!(f, "{:.4}s", secs)
        }
    }
}

/// Hardware format exposed by a capture device, with its exposure envelope
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Framerate,
    pub min_iso: f32,
    pub max_iso: f32,
    pub min_exposure_duration: ExposureDuration,
    pub max_exposure_duration: ExposureDuration,
    pub max_zoom_factor: f32,
}

impl std::fmt::Display for DeviceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} @ {}fps (exposure {}..{}, ISO {}..{})",
            self.width,
            self.height,
            self.framerate,
            self.min_exposure_duration,
            self.max_exposure_duration,
            self.min_iso,
            self.max_iso
        )
    }
}

/// Immutable snapshot of the active format's capability envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCapabilities {
    pub min_iso: f32,
    pub max_iso: f32,
    pub min_exposure_duration: ExposureDuration,
    pub max_exposure_duration: ExposureDuration,
    pub max_zoom_factor: f32,
}

impl DeviceCapabilities {
    /// Capabilities of a given hardware format
    pub fn from_format(format: &DeviceFormat) -> Self {
        Self {
            min_iso: format.min_iso,
            max_iso: format.max_iso,
            min_exposure_duration: format.min_exposure_duration,
            max_exposure_duration: format.max_exposure_duration,
            max_zoom_factor: format.max_zoom_factor,
        }
    }

    /// Clamp an ISO value into the device-reported range
    pub fn clamp_iso(&self, iso: f32) -> f32 {
        if iso.is_nan() {
            return self.min_iso;
        }
        iso.clamp(self.min_iso, self.max_iso.max(self.min_iso))
    }
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            min_iso: 100.0,
            max_iso: 100.0,
            min_exposure_duration: ExposureDuration::new(1, 1000),
            max_exposure_duration: ExposureDuration::new(1, 30),
            max_zoom_factor: 1.0,
        }
    }
}

/// Settings for a single hardware exposure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HardwareExposure {
    pub duration: ExposureDuration,
    pub iso: f32,
}

/// A single RGBA frame delivered by a capture device
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, shared between the stream and consumers
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGBA frame
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// RGBA bytes of row `y`, without padding
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let start = y as usize * self.stride as usize;
        let end = start + self.width as usize * 4;
        self.data.get(start..end)
    }

    /// Check that the buffer covers the advertised extent
    pub fn is_complete(&self) -> bool {
        if self.width == 0 || self.height == 0 || self.stride < self.width * 4 {
            return false;
        }
        let needed =
            (self.height as usize - 1) * self.stride as usize + self.width as usize * 4;
        self.data.len() >= needed
    }

    /// Copy into an 8-bit RGBA image, dropping row padding
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        if !self.is_complete() {
            return None;
        }
        let mut packed = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for y in 0..self.height {
            packed.extend_from_slice(self.row(y)?);
        }
        image::RgbaImage::from_raw(self.width, self.height, packed)
    }
}

/// Callback invoked by the device's stream thread for every delivered frame
pub type FrameCallback = Arc<dyn Fn(CameraFrame) + Send + Sync>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Device is not available (unplugged, not granted, shut down)
    NotAvailable(String),
    /// Device could not be locked for configuration
    LockFailed(String),
    /// Format not supported
    FormatNotSupported(String),
    /// Device rejected the requested exposure settings
    ConfigurationRejected(String),
    /// Single-shot capture failed
    CaptureFailed(String),
    /// Control queue is gone
    QueueClosed,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Device not available: {}", msg),
            BackendError::LockFailed(msg) => write!(f, "Failed to lock device: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::ConfigurationRejected(msg) => {
                write!(f, "Configuration rejected: {}", msg)
            }
            BackendError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            BackendError::QueueClosed => write!(f, "Control queue closed"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure_duration_exact_comparison() {
        let third = ExposureDuration::new(1, 3);
        let also_third = ExposureDuration::new(2, 6);
        assert_eq!(third.cmp_exact(&also_third), std::cmp::Ordering::Equal);
        assert_eq!(
            ExposureDuration::new(1, 30).cmp_exact(&third),
            std::cmp::Ordering::Less
        );
    }

    #[test]
    fn exposure_duration_from_invalid_seconds() {
        assert_eq!(ExposureDuration::from_secs_f64(-1.0).num, 0);
        assert_eq!(ExposureDuration::from_secs_f64(f64::NAN).num, 0);
    }

    #[test]
    fn clamp_iso_into_range() {
        let caps = DeviceCapabilities {
            min_iso: 50.0,
            max_iso: 3200.0,
            ..Default::default()
        };
        assert_eq!(caps.clamp_iso(10.0), 50.0);
        assert_eq!(caps.clamp_iso(6400.0), 3200.0);
        assert_eq!(caps.clamp_iso(400.0), 400.0);
    }

    #[test]
    fn frame_with_padding_converts_to_image() {
        // 2x2 frame, stride of 12 bytes (4 bytes padding per row)
        let mut data = vec![0u8; 24];
        data[0..8].copy_from_slice(&[1, 2, 3, 255, 4, 5, 6, 255]);
        data[12..20].copy_from_slice(&[7, 8, 9, 255, 10, 11, 12, 255]);
        let frame = CameraFrame {
            width: 2,
            height: 2,
            data: Arc::from(data),
            stride: 12,
            captured_at: Instant::now(),
        };

        let image = frame.to_rgba_image().unwrap();
        assert_eq!(image.get_pixel(1, 1).0, [10, 11, 12, 255]);
    }

    #[test]
    fn truncated_frame_is_incomplete() {
        let frame = CameraFrame::from_rgba(4, 4, vec![0u8; 10]);
        assert!(!frame.is_complete());
        assert!(frame.to_rgba_image().is_none());
    }
}
