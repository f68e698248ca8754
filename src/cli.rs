// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for long exposure operations
//!
//! This module provides command-line functionality for:
//! - Showing how a requested exposure would be captured
//! - Listing the simulated camera's formats
//! - Capturing and saving a long exposure

use long_exposure::backends::camera::{CaptureDevice, ControlQueue, DeviceCapabilities};
use long_exposure::backends::virtual_camera::VirtualCamera;
use long_exposure::config::Config;
use long_exposure::constants::PhotoOutputFormat;
use long_exposure::pipelines::long_exposure::{
    CaptureRequest, CaptureStatus, LongExposurePipeline, PipelineSettings, plan,
};
use long_exposure::pipelines::photo::{FilmFilter, PhotoEncoder};
use long_exposure::storage;
use std::io::Write;
use std::path::PathBuf;

/// Options for the `capture` command
pub struct CaptureOptions {
    pub duration: f64,
    pub iso: Option<f32>,
    pub filter: Option<FilmFilter>,
    pub format: Option<PhotoOutputFormat>,
    pub output: Option<PathBuf>,
    pub time_scale: f64,
}

/// List the simulated camera's formats
pub fn list_formats() -> Result<(), Box<dyn std::error::Error>> {
    let camera = VirtualCamera::with_default_formats();
    let formats = camera.formats();

    println!("Available formats:");
    println!();
    for (index, format) in formats.iter().enumerate() {
        println!("  [{}] {}", index, format);
    }

    Ok(())
}

/// Show the exposure plan for a duration without capturing
pub fn show_plan(duration: f64, iso: Option<f32>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let iso = iso.unwrap_or(config.default_iso);
    let request = CaptureRequest::new(duration, iso)?;

    let rt = tokio::runtime::Runtime::new()?;
    let caps: DeviceCapabilities = rt.block_on(async {
        let control = ControlQueue::new(Some(Box::new(VirtualCamera::with_default_formats())));
        control
            .select_format_for_max_exposure(config.min_format_width)
            .await?;
        control.capabilities().await
    })?;

    println!(
        "Device envelope: exposure {}..{}, ISO {}..{}",
        caps.min_exposure_duration, caps.max_exposure_duration, caps.min_iso, caps.max_iso
    );
    println!("Plan: {}", plan(&request, &caps, config.nominal_fps)?);
    Ok(())
}

/// Capture a long exposure from the simulated camera and save it
pub fn capture(options: CaptureOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    if let Some(filter) = options.filter {
        config.film_filter = filter;
    }
    if let Some(format) = options.format {
        config.output_format = format;
    }
    let iso = options.iso.unwrap_or(config.default_iso);
    let request = CaptureRequest::new(options.duration, iso)?;

    let output_dir = options
        .output
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(storage::default_photo_dir);

    let camera = VirtualCamera::with_default_formats().with_time_scale(options.time_scale);
    println!("Using camera: {}", camera.name());

    let rt = tokio::runtime::Runtime::new()?;
    let output_path = rt.block_on(async {
        let control = ControlQueue::new(Some(Box::new(camera)));
        let pipeline = LongExposurePipeline::new(control, PipelineSettings::from(&config));

        if !pipeline.prepare_device().await? {
            println!("No format reaches {} px wide; keeping the current one", config.min_format_width);
        }

        let cancel_handle = pipeline.clone();
        ctrlc::set_handler(move || {
            if cancel_handle.cancel() {
                eprintln!();
                eprintln!("Cancelling...");
            } else {
                std::process::exit(130);
            }
        })?;

        println!("Capturing {:.2}s exposure... (press Ctrl+C to cancel)", options.duration);
        let mut snapshots = pipeline.subscribe();
        let progress = tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.status == CaptureStatus::Collecting {
                    eprint!("\rCollecting frames: {:>5.1}%", snapshot.progress * 100.0);
                    let _ = std::io::stderr().flush();
                }
            }
        });

        let result = pipeline.request(request).await;
        progress.abort();
        eprintln!();
        let image = result?;

        let mut encoder = PhotoEncoder::new();
        encoder.set_format(config.output_format);
        encoder.set_quality(config.encoding_quality);
        let path = encoder.encode_and_save(image, output_dir).await?;
        Ok::<_, Box<dyn std::error::Error>>(path)
    })?;

    println!("Photo saved: {}", output_path.display());
    Ok(())
}
