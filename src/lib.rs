// SPDX-License-Identifier: MPL-2.0

//! Long Exposure - computational long exposure capture
//!
//! When a requested exposure is longer than the capture device can expose in
//! one shot, the crate averages a run of shorter stream frames into a single
//! image. Shorter requests are taken as one hardware exposure.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Capture device abstraction, control queue and virtual camera
//! - [`pipelines`]: Exposure planning, accumulation, film filters and encoding
//! - [`config`]: User configuration handling
//! - [`storage`]: Output locations
//!
//! # Example
//!
//! ```no_run
//! use long_exposure::backends::camera::ControlQueue;
//! use long_exposure::backends::virtual_camera::VirtualCamera;
//! use long_exposure::pipelines::long_exposure::{LongExposurePipeline, PipelineSettings};
//!
//! # async fn run() -> Result<(), long_exposure::errors::CaptureError> {
//! let control = ControlQueue::new(Some(Box::new(VirtualCamera::with_default_formats())));
//! let pipeline = LongExposurePipeline::new(control, PipelineSettings::default());
//! pipeline.prepare_device().await?;
//! let image = pipeline.request_long_exposure(4.0, 100.0).await?;
//! # let _ = image;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;
mod sync;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, AppResult, CaptureError};
pub use pipelines::long_exposure::{
    CaptureRequest, CaptureSnapshot, CaptureStatus, ExposurePlan, LongExposurePipeline,
};
pub use pipelines::photo::FilmFilter;
