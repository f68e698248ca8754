// SPDX-License-Identifier: GPL-3.0-only

//! Computational long exposure pipeline
//!
//! ```text
//! request ─► plan ─┬─ Hardware ──────► PhotoCaptureAdapter ──────────────┐
//!                  │                                                    ▼
//!                  └─ Computational ─► Configuring ─► Collecting ─► Finalizing ─► film filter
//!                                      (lock+apply)   (stream cb)   (reset, accumulate)
//! ```
//!
//! Device work goes through the [`ControlQueue`]; frames are appended on the
//! device's stream thread; observers read [`CaptureSnapshot`]s from a watch
//! channel. Only one capture may be in flight at a time.

pub mod accumulator;
pub mod plan;
pub mod session;
pub mod state;

pub use accumulator::{CompositeImage, accumulate};
pub use plan::{CaptureRequest, ExposurePlan, plan};
pub use session::{CaptureSession, CollectionEnd};
pub use state::{CaptureSnapshot, CaptureStateMachine, CaptureStatus};

use crate::backends::camera::ControlQueue;
use crate::backends::camera::types::{DeviceCapabilities, ExposureDuration, HardwareExposure};
use crate::config::Config;
use crate::errors::CaptureError;
use crate::pipelines::photo::{self, ControlQueueCapture, FilmFilter, PhotoCaptureAdapter};
use crate::sync::lock;
use image::RgbaImage;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

/// Pipeline settings taken from [`Config`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub nominal_fps: f64,
    pub min_format_width: u32,
    pub film_filter: FilmFilter,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            nominal_fps: config.nominal_fps,
            min_format_width: config.min_format_width,
            film_filter: config.film_filter,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

struct PipelineInner {
    control: ControlQueue,
    adapter: Arc<dyn PhotoCaptureAdapter>,
    settings: Mutex<PipelineSettings>,
    machine: Arc<Mutex<CaptureStateMachine>>,
    snapshots: watch::Receiver<CaptureSnapshot>,
    in_flight: AtomicBool,
    active: Mutex<Option<Arc<CaptureSession>>>,
}

/// Entry point for long exposure requests
///
/// Cheap to clone; clones share the same device and state.
#[derive(Clone)]
pub struct LongExposurePipeline {
    inner: Arc<PipelineInner>,
}

/// Clears the in-flight flag when a request ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CaptureError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| CaptureError::Busy)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LongExposurePipeline {
    /// Pipeline using the control queue for hardware stills as well
    pub fn new(control: ControlQueue, settings: PipelineSettings) -> Self {
        let adapter = Arc::new(ControlQueueCapture::new(control.clone()));
        Self::with_adapter(control, adapter, settings)
    }

    /// Pipeline with a custom single-shot capture adapter
    pub fn with_adapter(
        control: ControlQueue,
        adapter: Arc<dyn PhotoCaptureAdapter>,
        settings: PipelineSettings,
    ) -> Self {
        let machine = CaptureStateMachine::new();
        let snapshots = machine.subscribe();
        Self {
            inner: Arc::new(PipelineInner {
                control,
                adapter,
                settings: Mutex::new(settings),
                machine: Arc::new(Mutex::new(machine)),
                snapshots,
                in_flight: AtomicBool::new(false),
                active: Mutex::new(None),
            }),
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        *lock(&self.inner.settings)
    }

    /// Film filter used for subsequent captures
    pub fn set_film_filter(&self, filter: FilmFilter) {
        lock(&self.inner.settings).film_filter = filter;
    }

    /// Status of the current or last computational capture
    pub fn current_status(&self) -> CaptureStatus {
        self.inner.snapshots.borrow().status.clone()
    }

    /// Collection progress of the current or last computational capture
    pub fn current_progress(&self) -> f32 {
        self.inner.snapshots.borrow().progress
    }

    /// Watch status and progress changes
    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.inner.snapshots.clone()
    }

    /// Switch the device to the format with the longest exposure envelope
    ///
    /// Returns `Ok(false)` when no format meets the configured width floor.
    pub async fn prepare_device(&self) -> Result<bool, CaptureError> {
        let min_width = self.settings().min_format_width;
        self.inner
            .control
            .select_format_for_max_exposure(min_width)
            .await
            .map_err(|e| {
                warn!(error = %e, "Format selection failed");
                CaptureError::DeviceUnavailable
            })
    }

    /// Ask a collecting capture to stop at its next frame
    ///
    /// Returns false when nothing is collecting.
    pub fn cancel(&self) -> bool {
        if self.current_status() != CaptureStatus::Collecting {
            return false;
        }
        match lock(&self.inner.active).as_ref() {
            Some(session) => {
                info!(session = %session.id(), "Cancellation requested");
                session.cancel();
                true
            }
            None => false,
        }
    }

    /// Capture an exposure of `duration_seconds`
    pub async fn request_long_exposure(
        &self,
        duration_seconds: f64,
        iso_hint: f32,
    ) -> Result<RgbaImage, CaptureError> {
        let request = CaptureRequest::new(duration_seconds, iso_hint)?;
        self.request(request).await
    }

    /// Completion-callback form of [`Self::request`]
    ///
    /// `completion` receives `None` for every failure. Must be called from
    /// within a tokio runtime.
    pub fn request_with_completion<F>(
        &self,
        request: CaptureRequest,
        completion: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: FnOnce(Option<RgbaImage>) + Send + 'static,
    {
        let pipeline = self.clone();
        tokio::spawn(async move {
            let result = pipeline.request(request).await;
            if let Err(e) = &result {
                debug!(error = %e, "Capture completed without image");
            }
            completion(result.ok());
        })
    }

    /// Plan and run a validated request
    pub async fn request(&self, request: CaptureRequest) -> Result<RgbaImage, CaptureError> {
        let _in_flight = InFlight::acquire(&self.inner.in_flight)?;

        if !self.inner.control.has_device().await {
            warn!("Capture requested without a device");
            return Err(CaptureError::DeviceUnavailable);
        }

        let settings = self.settings();
        let caps = self.capabilities().await?;
        let plan = plan(&request, &caps, settings.nominal_fps)?;
        info!(
            target_secs = request.target_duration_seconds(),
            %plan,
            "Long exposure requested"
        );

        match plan {
            ExposurePlan::Hardware { duration, iso } => {
                self.run_hardware(HardwareExposure { duration, iso }, settings.film_filter)
                    .await
            }
            ExposurePlan::Computational {
                frame_count,
                per_frame_duration,
                iso,
                ..
            } => {
                self.run_computational(frame_count, per_frame_duration, iso, settings.film_filter)
                    .await
            }
        }
    }

    async fn capabilities(&self) -> Result<DeviceCapabilities, CaptureError> {
        self.inner.control.capabilities().await.map_err(|e| {
            warn!(error = %e, "Failed to read device capabilities");
            CaptureError::DeviceUnavailable
        })
    }

    async fn run_hardware(
        &self,
        settings: HardwareExposure,
        film_filter: FilmFilter,
    ) -> Result<RgbaImage, CaptureError> {
        let frame = self
            .inner
            .adapter
            .capture_once(settings)
            .await
            .map_err(|e| {
                error!(error = %e, "Hardware capture failed");
                CaptureError::HardwareCaptureFailed(e.to_string())
            })?;

        tokio::task::spawn_blocking(move || {
            let image = frame.to_rgba_image().ok_or(CaptureError::RenderFailure)?;
            Ok::<_, CaptureError>(photo::apply(film_filter, &image))
        })
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "Film filter task failed");
            Err(CaptureError::RenderFailure)
        })
    }

    async fn run_computational(
        &self,
        frame_count: u32,
        per_frame_duration: ExposureDuration,
        iso: f32,
        film_filter: FilmFilter,
    ) -> Result<RgbaImage, CaptureError> {
        lock(&self.inner.machine).begin()?;

        let (session, collection) = CaptureSession::new(frame_count, Arc::clone(&self.inner.machine));
        let span = info_span!("long_exposure", session = %session.id(), frame_count);

        async move {
            // Configuring
            if let Err(e) = self
                .inner
                .control
                .lock_and_configure(per_frame_duration, iso)
                .await
            {
                error!(error = %e, "Device configuration failed");
                let reason = CaptureError::ConfigurationError(e.to_string());
                lock(&self.inner.machine).transition(CaptureStatus::Failed(reason.clone()));
                return Err(reason);
            }

            // Collecting
            lock(&self.inner.machine).transition(CaptureStatus::Collecting);
            *lock(&self.inner.active) = Some(Arc::clone(&session));
            info!(%per_frame_duration, iso, "Collecting frames");

            let end = match self
                .inner
                .control
                .set_frame_callback(Some(session.frame_callback()))
                .await
            {
                Ok(()) => collection.await.unwrap_or(CollectionEnd::Interrupted),
                Err(e) => {
                    warn!(error = %e, "Failed to install frame callback");
                    session.interrupt();
                    CollectionEnd::Interrupted
                }
            };

            // Finalizing
            *lock(&self.inner.active) = None;
            lock(&self.inner.machine).finalize();
            self.restore_device().await;

            let frames = session.take_frames();
            let result = match end {
                CollectionEnd::Cancelled => Err(CaptureError::Cancelled),
                CollectionEnd::Interrupted => Err(CaptureError::StreamInterrupted),
                CollectionEnd::Complete => {
                    let collected = frames.len();
                    tokio::task::spawn_blocking(move || {
                        let composite = accumulate(&frames).ok_or(CaptureError::EmptyAccumulation)?;
                        let image = composite.render().ok_or(CaptureError::RenderFailure)?;
                        Ok::<_, CaptureError>(photo::apply(film_filter, &image))
                    })
                    .await
                    .unwrap_or_else(|e| {
                        error!(error = %e, collected, "Accumulation task failed");
                        Err(CaptureError::RenderFailure)
                    })
                }
            };

            let status = match &result {
                Ok(image) => {
                    info!(width = image.width(), height = image.height(), "Long exposure complete");
                    CaptureStatus::Done
                }
                Err(reason) => {
                    warn!(error = %reason, "Long exposure failed");
                    CaptureStatus::Failed(reason.clone())
                }
            };
            lock(&self.inner.machine).transition(status);
            result
        }
        .instrument(span)
        .await
    }

    /// Stop frame delivery and return to auto exposure
    async fn restore_device(&self) {
        if let Err(e) = self.inner.control.set_frame_callback(None).await {
            warn!(error = %e, "Failed to remove frame callback");
        }
        if let Err(e) = self.inner.control.reset_to_auto().await {
            warn!(error = %e, "Failed to restore auto exposure");
        }
    }
}
