// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for saved captures

use crate::constants::APP_DIR_NAME;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default output directory: `~/Pictures/long-exposure`
///
/// Falls back to the home directory, then the working directory, when the
/// platform has no pictures directory.
pub fn default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Timestamped file path in `dir` that does not exist yet
///
/// `prefix_YYYYMMDD_HHMMSS.ext`, with a numeric suffix when several
/// captures finish within the same second.
pub fn unique_output_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let base = format!("{}_{}", prefix, timestamp);

    let mut candidate = dir.join(format!("{}.{}", base, extension));
    let mut counter = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.{}", base, counter, extension));
        counter += 1;
    }

    debug!(path = %candidate.display(), "Output path chosen");
    candidate
}
