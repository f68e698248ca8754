// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use long_exposure::constants::{EncodingQuality, PhotoOutputFormat};

#[test]
fn test_encoding_quality_values() {
    // Test that all presets exist (Low, Medium, High, Maximum)
    assert_eq!(EncodingQuality::ALL.len(), 4);
}

#[test]
fn test_encoding_quality_ordering() {
    // Test that presets are ordered from lowest to highest quality
    let mut prev = 0u8;
    for preset in EncodingQuality::ALL {
        let quality = preset.jpeg_quality();
        assert!(quality > prev, "Presets should be ordered from lowest to highest");
        assert!(quality <= 100);
        prev = quality;
    }
}

#[test]
fn test_output_format_extensions() {
    assert_eq!(PhotoOutputFormat::Jpeg.extension(), "jpg");
    assert_eq!(PhotoOutputFormat::Png.extension(), "png");
}

#[test]
fn test_display_names() {
    // Test that all presets have non-empty display names
    for preset in EncodingQuality::ALL {
        assert!(!preset.display_name().is_empty(), "Preset {:?} has empty display name", preset);
    }
    for format in PhotoOutputFormat::ALL {
        assert!(!format.display_name().is_empty());
    }
}
