// SPDX-License-Identifier: GPL-3.0-only

//! Simulated capture device
//!
//! The virtual camera implements [`CaptureDevice`] without hardware. It
//! exposes a configurable list of formats, honours custom exposure settings
//! and streams synthetic frames from a paced background thread while a
//! frame callback is installed.
//!
//! # Architecture
//!
//! ```text
//! ControlQueue thread                Stream thread
//! ───────────────────                ─────────────
//! apply_format / lock_and_configure
//!        │  (restarts stream)
//!        ▼
//! set_frame_callback(Some(cb)) ───▶  render_frame() ──▶ cb(frame)
//! set_frame_callback(None)     ───▶  stop + join
//! ```

mod source;

pub use source::{exposure_gain, render_frame};

use crate::backends::camera::CaptureDevice;
use crate::backends::camera::frame_loop::{LoopAction, StreamLoopController};
use crate::backends::camera::types::{
    BackendError, BackendResult, CameraFrame, DeviceFormat, ExposureDuration, FrameCallback,
    Framerate,
};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Exposure mode of the simulated sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExposureMode {
    /// Continuous auto exposure (nominal frame interval, ISO 100)
    Auto,
    /// Custom exposure set through `lock_and_configure`
    Custom { duration: ExposureDuration, iso: f32 },
}

/// Virtual camera device
pub struct VirtualCamera {
    name: String,
    formats: Vec<DeviceFormat>,
    active: usize,
    mode: ExposureMode,
    /// Multiplier applied to real-time pacing (0.1 = ten times faster)
    time_scale: f64,
    callback: Option<FrameCallback>,
    stream: Option<StreamLoopController>,
    sequence: Arc<Mutex<u64>>,
}

impl VirtualCamera {
    /// Create a virtual camera exposing `formats`; the first one is active
    pub fn new(name: &str, formats: Vec<DeviceFormat>) -> Self {
        Self {
            name: name.to_string(),
            formats,
            active: 0,
            mode: ExposureMode::Auto,
            time_scale: 1.0,
            callback: None,
            stream: None,
            sequence: Arc::new(Mutex::new(0)),
        }
    }

    /// A camera with a typical phone-sensor format ladder
    pub fn with_default_formats() -> Self {
        Self::new("Virtual Camera", default_formats())
    }

    /// Speed up (or slow down) the simulated stream pacing
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = if time_scale.is_finite() && time_scale > 0.0 {
            time_scale
        } else {
            1.0
        };
        self
    }

    /// Current exposure mode
    pub fn exposure_mode(&self) -> ExposureMode {
        self.mode
    }

    fn active_format_ref(&self) -> Option<&DeviceFormat> {
        self.formats.get(self.active)
    }

    /// Exposure time and ISO the sensor currently uses
    fn current_exposure(&self) -> (f64, f32) {
        match self.mode {
            ExposureMode::Auto => {
                let interval = self
                    .active_format_ref()
                    .map(|f| f.framerate.frame_interval().as_secs_f64())
                    .unwrap_or(1.0 / 30.0);
                (interval, 100.0)
            }
            ExposureMode::Custom { duration, iso } => (duration.as_secs_f64(), iso),
        }
    }

    /// A frame can't be shorter than its exposure
    fn frame_interval(&self) -> Duration {
        let nominal = self
            .active_format_ref()
            .map(|f| f.framerate.frame_interval())
            .unwrap_or(Duration::from_millis(33));
        let (exposure, _) = self.current_exposure();
        nominal
            .max(Duration::from_secs_f64(exposure))
            .mul_f64(self.time_scale)
    }

    fn render(&self, sequence: u64) -> Option<CameraFrame> {
        let format = self.active_format_ref()?;
        let (exposure, iso) = self.current_exposure();
        let data = render_frame(
            format.width,
            format.height,
            sequence,
            exposure_gain(exposure, iso),
        );
        Some(CameraFrame::from_rgba(format.width, format.height, data))
    }

    fn stop_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
    }

    /// (Re)start streaming to the installed callback with current settings
    fn restart_stream(&mut self) {
        self.stop_stream();

        let Some(callback) = self.callback.clone() else {
            return;
        };
        let Some(format) = self.active_format_ref().cloned() else {
            return;
        };

        let (exposure, iso) = self.current_exposure();
        let gain = exposure_gain(exposure, iso);
        let interval = self.frame_interval();
        let sequence = Arc::clone(&self.sequence);

        debug!(
            width = format.width,
            height = format.height,
            interval_ms = interval.as_millis() as u64,
            gain,
            "Starting virtual camera stream"
        );

        self.stream = Some(StreamLoopController::start(
            "virtual-camera-stream",
            interval,
            move |_| {
                let seq = {
                    let Ok(mut seq) = sequence.lock() else {
                        return LoopAction::Stop;
                    };
                    *seq += 1;
                    *seq
                };
                let data = render_frame(format.width, format.height, seq, gain);
                callback(CameraFrame::from_rgba(format.width, format.height, data));
                LoopAction::Continue
            },
        ));
    }
}

impl Drop for VirtualCamera {
    fn drop(&mut self) {
        self.stop_stream();
    }
}

impl CaptureDevice for VirtualCamera {
    fn name(&self) -> &str {
        &self.name
    }

    fn formats(&self) -> Vec<DeviceFormat> {
        self.formats.clone()
    }

    fn active_format(&self) -> Option<DeviceFormat> {
        self.active_format_ref().cloned()
    }

    fn apply_format(&mut self, format: &DeviceFormat) -> BackendResult<()> {
        let index = self
            .formats
            .iter()
            .position(|f| f == format)
            .ok_or_else(|| BackendError::FormatNotSupported(format.to_string()))?;

        info!(format = %format, "Virtual camera format applied");
        self.active = index;
        self.mode = ExposureMode::Auto;
        self.restart_stream();
        Ok(())
    }

    fn lock_and_configure(&mut self, duration: ExposureDuration, iso: f32) -> BackendResult<()> {
        let format = self
            .active_format_ref()
            .ok_or_else(|| BackendError::NotAvailable("no active format".to_string()))?;

        if duration.cmp_exact(&format.max_exposure_duration) == Ordering::Greater
            || duration.cmp_exact(&format.min_exposure_duration) == Ordering::Less
        {
            return Err(BackendError::ConfigurationRejected(format!(
                "exposure {} outside {}..{}",
                duration, format.min_exposure_duration, format.max_exposure_duration
            )));
        }
        if !(format.min_iso..=format.max_iso).contains(&iso) {
            return Err(BackendError::ConfigurationRejected(format!(
                "ISO {} outside {}..{}",
                iso, format.min_iso, format.max_iso
            )));
        }

        debug!(duration = %duration, iso, "Virtual camera custom exposure");
        self.mode = ExposureMode::Custom { duration, iso };
        self.restart_stream();
        Ok(())
    }

    fn reset_to_auto(&mut self) -> BackendResult<()> {
        debug!("Virtual camera back to auto exposure");
        self.mode = ExposureMode::Auto;
        self.restart_stream();
        Ok(())
    }

    fn set_frame_callback(&mut self, callback: Option<FrameCallback>) -> BackendResult<()> {
        self.callback = callback;
        if self.callback.is_some() {
            self.restart_stream();
        } else {
            self.stop_stream();
        }
        Ok(())
    }

    fn capture_photo(&mut self) -> BackendResult<CameraFrame> {
        let sequence = {
            let mut seq = self
                .sequence
                .lock()
                .map_err(|_| BackendError::Other("sequence lock poisoned".to_string()))?;
            *seq += 1;
            *seq
        };
        self.render(sequence)
            .ok_or_else(|| BackendError::CaptureFailed("no active format".to_string()))
    }
}

/// Format ladder resembling a phone main sensor
///
/// The high resolution modes cap single exposures at 1/3 s, the binned
/// low resolution mode allows up to 1 s.
pub fn default_formats() -> Vec<DeviceFormat> {
    let envelope = |width, height, max_exposure| DeviceFormat {
        width,
        height,
        framerate: Framerate::from_int(30),
        min_iso: 32.0,
        max_iso: 3200.0,
        min_exposure_duration: ExposureDuration::new(1, 8000),
        max_exposure_duration: max_exposure,
        max_zoom_factor: 8.0,
    };

    vec![
        envelope(1280, 720, ExposureDuration::from_secs(1)),
        envelope(1920, 1080, ExposureDuration::new(1, 4)),
        envelope(1920, 1440, ExposureDuration::new(1, 3)),
        envelope(3840, 2160, ExposureDuration::new(1, 3)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn small_camera() -> VirtualCamera {
        let format = DeviceFormat {
            width: 8,
            height: 6,
            framerate: Framerate::from_int(200),
            min_iso: 50.0,
            max_iso: 1600.0,
            min_exposure_duration: ExposureDuration::new(1, 8000),
            max_exposure_duration: ExposureDuration::new(1, 100),
            max_zoom_factor: 1.0,
        };
        VirtualCamera::new("test", vec![format])
    }

    #[test]
    fn test_configure_outside_envelope_is_rejected() {
        let mut camera = small_camera();
        assert!(matches!(
            camera.lock_and_configure(ExposureDuration::from_secs(1), 100.0),
            Err(BackendError::ConfigurationRejected(_))
        ));
        assert!(matches!(
            camera.lock_and_configure(ExposureDuration::new(1, 200), 6400.0),
            Err(BackendError::ConfigurationRejected(_))
        ));
        assert_eq!(camera.exposure_mode(), ExposureMode::Auto);
    }

    #[test]
    fn test_configure_and_reset() {
        let mut camera = small_camera();
        camera
            .lock_and_configure(ExposureDuration::new(1, 200), 400.0)
            .unwrap();
        assert!(matches!(camera.exposure_mode(), ExposureMode::Custom { .. }));
        camera.reset_to_auto().unwrap();
        assert_eq!(camera.exposure_mode(), ExposureMode::Auto);
    }

    #[test]
    fn test_stream_delivers_frames_to_callback() {
        let mut camera = small_camera();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);
        let callback: FrameCallback = Arc::new(move |frame: CameraFrame| {
            assert_eq!(frame.width, 8);
            counter.fetch_add(1, AtomicOrdering::SeqCst);
        });

        camera.set_frame_callback(Some(callback)).unwrap();
        std::thread::sleep(Duration::from_millis(60));
        camera.set_frame_callback(None).unwrap();

        let delivered = received.load(AtomicOrdering::SeqCst);
        assert!(delivered > 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(received.load(AtomicOrdering::SeqCst), delivered);
    }

    #[test]
    fn test_capture_photo_uses_active_format() {
        let mut camera = small_camera();
        let frame = camera.capture_photo().unwrap();
        assert_eq!((frame.width, frame.height), (8, 6));
        assert!(frame.is_complete());
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let mut camera = small_camera();
        let mut other = camera.active_format().unwrap();
        other.width = 4000;
        assert!(matches!(
            camera.apply_format(&other),
            Err(BackendError::FormatNotSupported(_))
        ));
    }
}
