// SPDX-License-Identifier: GPL-3.0-only

//! Serialized device control queue
//!
//! The queue provides:
//! - One dedicated thread that owns the capture device
//! - FIFO execution of every device mutation (format, exposure, callbacks)
//! - Async replies so callers never block on hardware

use super::capabilities::DeviceCapabilityModel;
use super::types::*;
use super::CaptureDevice;
use std::thread;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// State owned by the control thread
pub struct ControlState {
    device: Option<Box<dyn CaptureDevice>>,
    model: DeviceCapabilityModel,
}

impl ControlState {
    fn device_mut(&mut self) -> BackendResult<&mut (dyn CaptureDevice + 'static)> {
        self.device
            .as_deref_mut()
            .ok_or_else(|| BackendError::NotAvailable("no capture device attached".to_string()))
    }
}

type ControlJob = Box<dyn FnOnce(&mut ControlState) + Send>;

/// A unit of work for the control thread
struct ControlCommand {
    label: &'static str,
    job: ControlJob,
}

/// Handle to the serialized control queue
///
/// Cheap to clone; the control thread exits once every handle is dropped.
#[derive(Clone)]
pub struct ControlQueue {
    sender: mpsc::UnboundedSender<ControlCommand>,
}

impl ControlQueue {
    /// Start the control thread, optionally with a device attached
    pub fn new(device: Option<Box<dyn CaptureDevice>>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<ControlCommand>();

        let model = match device.as_deref() {
            Some(device) => DeviceCapabilityModel::new(device),
            None => DeviceCapabilityModel::default(),
        };
        let mut state = ControlState { device, model };

        info!(
            device = state.device.as_ref().map(|d| d.name().to_string()),
            "Starting camera control queue"
        );

        let spawned = thread::Builder::new()
            .name("camera-control".to_string())
            .spawn(move || {
                while let Some(command) = receiver.blocking_recv() {
                    debug!(command = command.label, "Running control command");
                    (command.job)(&mut state);
                }
                if let Some(device) = state.device.as_mut() {
                    // Never leave the stream feeding a dead session
                    let _ = device.set_frame_callback(None);
                }
                debug!("Camera control queue exiting");
            });

        if let Err(e) = spawned {
            // Without a thread every command resolves to QueueClosed
            warn!(error = %e, "Failed to spawn camera control thread");
        }

        Self { sender }
    }

    /// Run a job on the control thread and await its result
    async fn run<R, F>(&self, label: &'static str, f: F) -> BackendResult<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut ControlState) -> R + Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let job: ControlJob = Box::new(move |state| {
            let _ = reply.send(f(state));
        });

        self.sender
            .send(ControlCommand { label, job })
            .map_err(|_| BackendError::QueueClosed)?;

        result.await.map_err(|_| BackendError::QueueClosed)
    }

    /// Whether a device handle is currently attached
    pub async fn has_device(&self) -> bool {
        self.run("has_device", |state| state.device.is_some())
            .await
            .unwrap_or(false)
    }

    /// Attach a new device (or detach with `None`) and refresh capabilities
    pub async fn replace_device(&self, device: Option<Box<dyn CaptureDevice>>) -> BackendResult<()> {
        self.run("replace_device", move |state| {
            if let Some(old) = state.device.as_mut() {
                let _ = old.set_frame_callback(None);
            }
            state.device = device;
            state.model = match state.device.as_deref() {
                Some(device) => DeviceCapabilityModel::new(device),
                None => DeviceCapabilityModel::default(),
            };
            info!(
                device = state.device.as_ref().map(|d| d.name().to_string()),
                "Capture device replaced"
            );
        })
        .await
    }

    /// Capability snapshot of the active format
    pub async fn capabilities(&self) -> BackendResult<DeviceCapabilities> {
        self.run("capabilities", |state| {
            state.device_mut()?;
            Ok(state.model.capabilities())
        })
        .await?
    }

    /// All formats exposed by the attached device
    pub async fn formats(&self) -> BackendResult<Vec<DeviceFormat>> {
        self.run("formats", |state| Ok(state.device_mut()?.formats()))
            .await?
    }

    /// The active hardware format
    pub async fn active_format(&self) -> BackendResult<Option<DeviceFormat>> {
        self.run("active_format", |state| Ok(state.device_mut()?.active_format()))
            .await?
    }

    /// Apply the format with the longest maximum exposure above `min_width`
    ///
    /// Soft failure: returns `Ok(false)` when nothing qualifies.
    pub async fn select_format_for_max_exposure(&self, min_width: u32) -> BackendResult<bool> {
        self.run("select_format_for_max_exposure", move |state| {
            let ControlState { device, model } = state;
            let device = device
                .as_deref_mut()
                .ok_or_else(|| BackendError::NotAvailable("no capture device attached".into()))?;
            Ok(model.select_format_for_max_exposure(device, min_width))
        })
        .await?
    }

    /// Lock, apply custom exposure, unlock
    pub async fn lock_and_configure(&self, duration: ExposureDuration, iso: f32) -> BackendResult<()> {
        self.run("lock_and_configure", move |state| {
            state.device_mut()?.lock_and_configure(duration, iso)
        })
        .await?
    }

    /// Return the device to continuous auto exposure
    pub async fn reset_to_auto(&self) -> BackendResult<()> {
        self.run("reset_to_auto", |state| state.device_mut()?.reset_to_auto())
            .await?
    }

    /// Install or remove the frame stream callback
    pub async fn set_frame_callback(&self, callback: Option<FrameCallback>) -> BackendResult<()> {
        self.run("set_frame_callback", move |state| {
            state.device_mut()?.set_frame_callback(callback)
        })
        .await?
    }

    /// Single hardware exposure: configure, capture, restore auto exposure
    ///
    /// The three steps run as one job so nothing can reconfigure the device
    /// between them. Auto exposure is restored even if the capture fails.
    pub async fn capture_photo(&self, settings: HardwareExposure) -> BackendResult<CameraFrame> {
        self.run("capture_photo", move |state| {
            let device = state.device_mut()?;
            device.lock_and_configure(settings.duration, settings.iso)?;
            let frame = device.capture_photo();
            if let Err(e) = device.reset_to_auto() {
                warn!(error = %e, "Failed to restore auto exposure after capture");
            }
            frame
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_without_device() {
        let queue = ControlQueue::new(None);
        assert!(!queue.has_device().await);
        assert!(matches!(
            queue.capabilities().await,
            Err(BackendError::NotAvailable(_))
        ));
        assert!(matches!(
            queue.reset_to_auto().await,
            Err(BackendError::NotAvailable(_))
        ));
    }

    #[tokio::test]
    async fn test_commands_run_in_order() {
        let queue = ControlQueue::new(None);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut pending = Vec::new();
        for i in 0..16 {
            let seen = std::sync::Arc::clone(&seen);
            pending.push(queue.run("order", move |_| seen.lock().unwrap().push(i)));
        }
        for result in futures::future::join_all(pending).await {
            result.unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), (0..16).collect::<Vec<_>>());
    }
}
