// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for capture devices
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Pipeline Layer                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                  │
//! │  ┌──────────────────┐  ┌────────────────┐   │
//! │  │  Control Queue   │  │ Virtual Camera │   │
//! │  │ (device owner)   │  │  (simulated)   │   │
//! │  └──────────────────┘  └────────────────┘   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Device trait, capability negotiation and the control queue
//! - [`virtual_camera`]: Simulated device streaming synthetic frames

pub mod camera;
pub mod virtual_camera;
