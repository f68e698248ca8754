// SPDX-License-Identifier: GPL-3.0-only

//! Additive frame compositing
//!
//! Frames are summed per channel into `u32` accumulators, which stay exact
//! for up to 16 million 8-bit frames, then scaled by `1/count`.

use crate::backends::camera::types::CameraFrame;
use image::RgbaImage;
use tracing::{debug, warn};

/// Normalized average of a frame sequence
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    width: u32,
    height: u32,
    /// RGBA, each channel in `[0, 255]`
    pixels: Vec<f32>,
    frame_count: usize,
}

impl CompositeImage {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames folded into this composite
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Materialize into an 8-bit image
    ///
    /// Returns `None` when the buffer does not describe a drawable image.
    pub fn render(&self) -> Option<RgbaImage> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let bytes: Vec<u8> = self
            .pixels
            .iter()
            .map(|value| value.round().clamp(0.0, 255.0) as u8)
            .collect();
        RgbaImage::from_raw(self.width, self.height, bytes)
    }
}

/// Average `frames` into one composite
///
/// The first complete frame fixes the extent; frames that are truncated or
/// have a different extent are skipped.
pub fn accumulate(frames: &[CameraFrame]) -> Option<CompositeImage> {
    let reference = frames.iter().position(CameraFrame::is_complete)?;
    let (width, height) = (frames[reference].width, frames[reference].height);

    let mut sums = vec![0u32; width as usize * height as usize * 4];
    let mut count = 0usize;

    for (index, frame) in frames.iter().enumerate().skip(reference) {
        if frame.width != width || frame.height != height {
            warn!(
                index,
                width = frame.width,
                height = frame.height,
                expected_width = width,
                expected_height = height,
                "Skipping frame with mismatched extent"
            );
            continue;
        }
        if !frame.is_complete() {
            warn!(index, "Skipping truncated frame");
            continue;
        }

        for y in 0..height {
            let Some(row) = frame.row(y) else {
                continue;
            };
            let start = y as usize * width as usize * 4;
            for (sum, &value) in sums[start..start + row.len()].iter_mut().zip(row) {
                *sum += value as u32;
            }
        }
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let scale = 1.0 / count as f64;
    let pixels = sums
        .chunks_exact(4)
        .flat_map(|px| {
            [
                (px[0] as f64 * scale) as f32,
                (px[1] as f64 * scale) as f32,
                (px[2] as f64 * scale) as f32,
                255.0,
            ]
        })
        .collect();

    debug!(width, height, frames = count, "Frames accumulated");

    Some(CompositeImage {
        width,
        height,
        pixels,
        frame_count: count,
    })
}
