// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Nominal stream rate used to size computational exposures
pub const NOMINAL_FPS: f64 = 30.0;

/// Most frames one computational exposure may collect (30 s at 30 fps)
pub const MAX_FRAME_COUNT: u32 = 900;

/// Minimum format width accepted when picking the long exposure format
pub const MIN_FORMAT_WIDTH: u32 = 1920;

/// ISO used when the caller has no preference
pub const DEFAULT_ISO: f32 = 100.0;

/// Directory name under the user's pictures and config directories
pub const APP_DIR_NAME: &str = "long-exposure";

/// File name prefix for saved captures
pub const FILE_PREFIX: &str = "long_exposure";

/// Photo output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PhotoOutputFormat {
    /// JPEG (lossy, small files)
    #[default]
    Jpeg,
    /// PNG (lossless)
    Png,
}

impl PhotoOutputFormat {
    /// Get all variants for iteration
    pub const ALL: [PhotoOutputFormat; 2] = [PhotoOutputFormat::Jpeg, PhotoOutputFormat::Png];

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoOutputFormat::Jpeg => "jpg",
            PhotoOutputFormat::Png => "png",
        }
    }

    /// Get display name for the format
    pub fn display_name(&self) -> &'static str {
        match self {
            PhotoOutputFormat::Jpeg => "JPEG",
            PhotoOutputFormat::Png => "PNG",
        }
    }
}

/// JPEG quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get all presets ordered from lowest to highest quality
    pub const ALL: [EncodingQuality; 4] = [
        EncodingQuality::Low,
        EncodingQuality::Medium,
        EncodingQuality::High,
        EncodingQuality::Maximum,
    ];

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            EncodingQuality::Low => "Low",
            EncodingQuality::Medium => "Medium",
            EncodingQuality::High => "High",
            EncodingQuality::Maximum => "Maximum",
        }
    }
}
