// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────────┐     ┌──────────────┐
//! │ Stream frames│ ──▶ │ Long exposure pipeline │ ──▶ │  RgbaImage   │
//! │  or a still  │     │  - Plan                │     │              │
//! │              │     │  - Accumulate          │     │              │
//! │              │     │  - Film filter         │     │              │
//! └──────────────┘     └────────────────────────┘     └──────┬───────┘
//!                                                            ▼
//!                                                    PhotoEncoder (JPEG/PNG)
//! ```
//!
//! # Modules
//!
//! - [`long_exposure`]: Exposure planning, frame collection and compositing
//! - [`photo`]: Single stills, film filters and encoding

pub mod long_exposure;
pub mod photo;
