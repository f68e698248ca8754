// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{
    APP_DIR_NAME, DEFAULT_ISO, EncodingQuality, MIN_FORMAT_WIDTH, NOMINAL_FPS, PhotoOutputFormat,
};
use crate::errors::AppResult;
use crate::pipelines::photo::FilmFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nominal stream rate used to size computational exposures
    pub nominal_fps: f64,
    /// Minimum width of the format selected for long exposures
    pub min_format_width: u32,
    /// ISO requested when the caller gives none
    pub default_iso: f32,
    /// Film filter applied to every finished capture
    pub film_filter: FilmFilter,
    /// Output file format for saved captures
    pub output_format: PhotoOutputFormat,
    /// JPEG quality preset
    pub encoding_quality: EncodingQuality,
    /// Output directory (defaults to ~/Pictures/long-exposure)
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nominal_fps: NOMINAL_FPS,
            min_format_width: MIN_FORMAT_WIDTH,
            default_iso: DEFAULT_ISO,
            film_filter: FilmFilter::default(),
            output_format: PhotoOutputFormat::default(),
            encoding_quality: EncodingQuality::default(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Default location: `$XDG_CONFIG_HOME/long-exposure/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the config from the default location
    ///
    /// A missing or unreadable file yields the defaults.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load the config from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str::<Config>(&contents) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Save the config as pretty-printed JSON
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Replace out-of-range values with defaults
    fn sanitized(mut self) -> Self {
        if !self.nominal_fps.is_finite() || self.nominal_fps <= 0.0 {
            warn!(nominal_fps = self.nominal_fps, "Invalid nominal fps, using default");
            self.nominal_fps = NOMINAL_FPS;
        }
        if !self.default_iso.is_finite() || self.default_iso <= 0.0 {
            self.default_iso = DEFAULT_ISO;
        }
        self
    }
}
