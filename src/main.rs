// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use long_exposure::constants::PhotoOutputFormat;
use long_exposure::pipelines::photo::FilmFilter;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "long-exposure")]
#[command(about = "Computational long exposure capture")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how an exposure would be captured
    Plan {
        /// Exposure duration in seconds
        duration: f64,

        /// ISO hint (default from config)
        #[arg(short, long)]
        iso: Option<f32>,
    },

    /// List the simulated camera's formats
    Formats,

    /// Capture a long exposure
    Capture {
        /// Exposure duration in seconds
        duration: f64,

        /// ISO hint (default from config)
        #[arg(short, long)]
        iso: Option<f32>,

        /// Film filter applied to the result (e.g. mono, sepia, vivid)
        #[arg(short, long)]
        filter: Option<FilmFilter>,

        /// Save as PNG instead of the configured format
        #[arg(long)]
        png: bool,

        /// Output directory (default: ~/Pictures/long-exposure)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pacing multiplier for the simulated stream (0.1 = ten times faster)
        #[arg(long, default_value = "1.0")]
        time_scale: f64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=long_exposure=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan { duration, iso } => cli::show_plan(duration, iso),
        Commands::Formats => cli::list_formats(),
        Commands::Capture {
            duration,
            iso,
            filter,
            png,
            output,
            time_scale,
        } => cli::capture(cli::CaptureOptions {
            duration,
            iso,
            filter,
            format: png.then_some(PhotoOutputFormat::Png),
            output,
            time_scale,
        }),
    }
}
