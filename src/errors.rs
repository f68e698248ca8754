// SPDX-License-Identifier: MPL-2.0

//! Error types for the long exposure pipeline

use crate::backends::camera::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type used by the command line front end
#[derive(Debug, Clone)]
pub enum AppError {
    /// Capture pipeline errors
    Capture(CaptureError),
    /// Device backend errors
    Backend(BackendError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Why a capture request produced no image
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// No capture device handle when the request arrived
    DeviceUnavailable,
    /// Another capture is still in flight
    Busy,
    /// The request itself is unusable (e.g. non-positive duration)
    InvalidRequest(String),
    /// Locking or configuring the device failed
    ConfigurationError(String),
    /// Collection finished without any usable frame
    EmptyAccumulation,
    /// The composite could not be materialized into an output image
    RenderFailure,
    /// The caller cancelled the capture
    Cancelled,
    /// The frame stream stopped before enough frames arrived
    StreamInterrupted,
    /// Single-shot hardware capture failed
    HardwareCaptureFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Backend(e) => write!(f, "Device error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::DeviceUnavailable => write!(f, "No capture device available"),
            CaptureError::Busy => write!(f, "A capture is already in progress"),
            CaptureError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            CaptureError::ConfigurationError(msg) => {
                write!(f, "Device configuration failed: {}", msg)
            }
            CaptureError::EmptyAccumulation => write!(f, "No frames were accumulated"),
            CaptureError::RenderFailure => write!(f, "Failed to render composite image"),
            CaptureError::Cancelled => write!(f, "Capture cancelled"),
            CaptureError::StreamInterrupted => write!(f, "Frame stream interrupted"),
            CaptureError::HardwareCaptureFailed(msg) => {
                write!(f, "Hardware capture failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CaptureError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
