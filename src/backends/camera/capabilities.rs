// SPDX-License-Identifier: GPL-3.0-only

//! Device capability negotiation
//!
//! Picks the hardware format that allows the longest single exposure while
//! keeping a minimum output resolution, and caches the capability envelope
//! of whatever format ends up active.

use super::CaptureDevice;
use super::types::{DeviceCapabilities, DeviceFormat};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Capability model owned by the control queue
///
/// The snapshot is only rebuilt on the control thread, right after the
/// active format changes; everyone else receives copies.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilityModel {
    capabilities: DeviceCapabilities,
}

impl DeviceCapabilityModel {
    /// Build the model from the device's active format
    pub fn new(device: &dyn CaptureDevice) -> Self {
        Self {
            capabilities: device.capabilities(),
        }
    }

    /// Current capability snapshot
    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    /// Re-read the capability envelope from the device
    pub fn refresh(&mut self, device: &dyn CaptureDevice) {
        self.capabilities = device.capabilities();
        debug!(
            min_iso = self.capabilities.min_iso,
            max_iso = self.capabilities.max_iso,
            max_exposure = %self.capabilities.max_exposure_duration,
            "Capabilities refreshed"
        );
    }

    /// Select and apply the format with the longest maximum exposure
    ///
    /// Returns `true` if a format met the width floor and was applied.
    /// Otherwise the active format and capabilities stay as they were.
    pub fn select_format_for_max_exposure(
        &mut self,
        device: &mut dyn CaptureDevice,
        min_width: u32,
    ) -> bool {
        let formats = device.formats();
        let Some(index) = best_format_for_max_exposure(&formats, min_width) else {
            warn!(
                min_width,
                available = formats.len(),
                "No format meets the resolution floor, keeping active format"
            );
            return false;
        };

        let format = &formats[index];
        if let Err(e) = device.apply_format(format) {
            warn!(error = %e, format = %format, "Failed to apply long exposure format");
            return false;
        }

        info!(format = %format, "Selected format for maximum exposure");
        self.refresh(device);
        true
    }
}

/// Index of the format with the strictly greatest maximum exposure among
/// those at least `min_width` pixels wide; ties keep the first one found
pub fn best_format_for_max_exposure(formats: &[DeviceFormat], min_width: u32) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (index, format) in formats.iter().enumerate() {
        if format.width < min_width {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                format
                    .max_exposure_duration
                    .cmp_exact(&formats[current].max_exposure_duration)
                    == Ordering::Greater
            }
        };
        if better {
            best = Some(index);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{ExposureDuration, Framerate};

    fn format(width: u32, max_exposure: ExposureDuration) -> DeviceFormat {
        DeviceFormat {
            width,
            height: width * 9 / 16,
            framerate: Framerate::from_int(30),
            min_iso: 50.0,
            max_iso: 3200.0,
            min_exposure_duration: ExposureDuration::new(1, 8000),
            max_exposure_duration: max_exposure,
            max_zoom_factor: 4.0,
        }
    }

    #[test]
    fn test_width_floor_filters_formats() {
        let formats = vec![
            format(1280, ExposureDuration::from_secs(2)),
            format(1920, ExposureDuration::new(1, 3)),
        ];
        assert_eq!(best_format_for_max_exposure(&formats, 1920), Some(1));
    }

    #[test]
    fn test_longest_exposure_wins() {
        let formats = vec![
            format(1920, ExposureDuration::new(1, 30)),
            format(3840, ExposureDuration::new(1, 2)),
            format(1920, ExposureDuration::new(1, 3)),
        ];
        assert_eq!(best_format_for_max_exposure(&formats, 1920), Some(1));
    }

    #[test]
    fn test_ties_keep_first() {
        let formats = vec![
            format(1920, ExposureDuration::new(1, 3)),
            format(3840, ExposureDuration::new(2, 6)),
        ];
        assert_eq!(best_format_for_max_exposure(&formats, 1920), Some(0));
    }

    #[test]
    fn test_no_format_meets_floor() {
        let formats = vec![format(640, ExposureDuration::from_secs(1))];
        assert_eq!(best_format_for_max_exposure(&formats, 1920), None);
        assert_eq!(best_format_for_max_exposure(&[], 1920), None);
    }
}
