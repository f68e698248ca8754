// SPDX-License-Identifier: MPL-2.0

//! Photo output stages
//!
//! ```text
//! Device → Capture → Film filter → Encoding → Disk I/O
//! ```
//!
//! The long exposure pipeline feeds its composite into the same filter and
//! encoder stages as single hardware stills.

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::{ControlQueueCapture, PhotoCaptureAdapter};
pub use encoding::{EncodedImage, PhotoEncoder};
pub use processing::{FilmFilter, apply};
