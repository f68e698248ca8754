// SPDX-License-Identifier: MPL-2.0

//! Capture device abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │  LongExposurePipeline   │
//! └────────────┬────────────┘
//!              │ async commands
//!              ▼
//! ┌─────────────────────────┐
//! │      ControlQueue       │  ← Serializes every device mutation
//! └────────────┬────────────┘
//!              │
//!              ▼
//! ┌─────────────────────────┐
//! │  CaptureDevice Trait    │  ← Common interface
//! └────────────┬────────────┘
//!              │
//!              ▼
//!      ┌───────────────┐
//!      │ VirtualCamera │  ← Simulated implementation
//!      └───────────────┘
//! ```

pub mod capabilities;
pub mod frame_loop;
pub mod manager;
pub mod types;

pub use capabilities::DeviceCapabilityModel;
pub use manager::ControlQueue;
pub use types::*;

/// Capture device trait
///
/// Every method is called from the control queue thread only, so
/// implementations never see two reconfigurations racing each other.
/// Frames are delivered on the device's own stream thread through the
/// installed [`FrameCallback`].
pub trait CaptureDevice: Send {
    /// Human readable device name
    fn name(&self) -> &str;

    /// All hardware formats the device exposes
    fn formats(&self) -> Vec<DeviceFormat>;

    /// The currently active hardware format
    fn active_format(&self) -> Option<DeviceFormat>;

    /// Make `format` the active hardware format
    fn apply_format(&mut self, format: &DeviceFormat) -> BackendResult<()>;

    /// Capability envelope of the active format
    fn capabilities(&self) -> DeviceCapabilities {
        self.active_format()
            .map(|format| DeviceCapabilities::from_format(&format))
            .unwrap_or_default()
    }

    /// Lock the device, switch to custom exposure with the given duration
    /// and ISO, then unlock it
    fn lock_and_configure(&mut self, duration: ExposureDuration, iso: f32) -> BackendResult<()>;

    /// Return the device to continuous automatic exposure
    fn reset_to_auto(&mut self) -> BackendResult<()>;

    /// Install or remove the frame stream callback
    fn set_frame_callback(&mut self, callback: Option<FrameCallback>) -> BackendResult<()>;

    /// Trigger a single hardware capture with the current settings
    fn capture_photo(&mut self) -> BackendResult<CameraFrame>;
}
