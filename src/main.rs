// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "stereo-cloud")]
#[command(about = "Live point cloud pipeline for stereo depth cameras")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline against a synthetic frame source
    Demo {
        /// Number of frames to submit
        #[arg(short, long, default_value = "120")]
        frames: u64,

        /// Configuration file (JSON); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write a LAS snapshot of the last displayed cloud on exit
        #[arg(short, long)]
        snapshot: bool,
    },

    /// Write the default configuration to a JSON file
    InitConfig {
        /// Output file path
        #[arg(short, long, default_value = "stereo-cloud.json")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=stereo_cloud=debug, RUST_LOG=info
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
        Some(Commands::Demo {
            frames,
            config,
            snapshot,
        }) => cli::run_demo(frames, config, snapshot),
        Some(Commands::InitConfig { output }) => cli::write_default_config(&output),
        None => cli::run_demo(120, None, false),
    }
}
