// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Instaflat — flatten photographed instant prints.
//
// Entry point. Initialises logging, loads the engine config, and dispatches
// the subcommand.

mod commands;
mod config_dir;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use instaflat_core::human_errors::humanize_error;
use instaflat_core::{PrintFormat, Quadrilateral, Viewport};

use commands::parse_corners;

#[derive(Parser, Debug)]
#[command(
    name = "instaflat",
    about = "Detect, straighten, and crop instant prints in photos",
    version
)]
struct Cli {
    /// Engine config JSON (default: $XDG_CONFIG_HOME/instaflat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in print formats
    Formats,

    /// Find the print in a photo and print its corners as JSON
    Detect {
        /// Photo to analyse
        image: PathBuf,

        /// Display size the normalized corners refer to (default: image size)
        #[arg(long, value_name = "WxH")]
        viewport: Option<Viewport>,

        /// Clockwise rotation applied before detection, in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rotate: f32,

        /// Format whose guide quad is reported when nothing is found
        #[arg(long)]
        format: Option<PrintFormat>,
    },

    /// Flatten the print into a fixed-ratio image
    Rectify {
        /// Photo to flatten
        image: PathBuf,

        /// Output image path
        #[arg(short, long)]
        output: PathBuf,

        /// Print format: mini, square, wide, or WxH in millimetres
        #[arg(long)]
        format: Option<PrintFormat>,

        /// Clockwise rotation applied first, in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        rotate: f32,

        /// Display size the corners refer to (default: image size)
        #[arg(long, value_name = "WxH")]
        viewport: Option<Viewport>,

        /// Corners in normalized 0-100 coordinates: "x,y x,y x,y x,y"
        /// (top-left, top-right, bottom-right, bottom-left)
        #[arg(long, value_parser = parse_corners)]
        corners: Option<Quadrilateral>,

        /// Push every corner outward (negative shrinks); without a value the
        /// configured expand step is used
        #[arg(long, num_args = 0..=1, allow_negative_numbers = true)]
        expand: Option<Option<f64>>,

        /// Skip automatic detection and use the guide quad
        #[arg(long)]
        no_detect: bool,

        /// Write PNG instead of JPEG
        #[arg(long)]
        png: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Instaflat starting");

    let result = match config_dir::load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Command::Formats => commands::formats(),
            Command::Detect {
                image,
                viewport,
                rotate,
                format,
            } => {
                commands::detect(
                    &config,
                    commands::DetectArgs {
                        image,
                        viewport,
                        rotate,
                        format,
                    },
                )
                .await
            }
            Command::Rectify {
                image,
                output,
                format,
                rotate,
                viewport,
                corners,
                expand,
                no_detect,
                png,
            } => {
                let expand = commands::expand_amount(expand, config.output.expand_step);
                commands::rectify(
                    config,
                    commands::RectifyArgs {
                        image,
                        output,
                        format,
                        rotate,
                        viewport,
                        corners,
                        expand,
                        detect: !no_detect,
                        png,
                    },
                )
            }
        },
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}
