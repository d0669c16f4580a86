// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod recognize;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// LPR Node CLI
#[derive(Parser, Debug)]
#[command(name = "lpr-cli")]
#[command(version = "1.0.0")]
#[command(about = "Run license plate recognition on local files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recognise the plate in one image
    Image(recognize::ImageArgs),

    /// Annotate a video and list the plates seen in it
    Video(recognize::VideoArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Image(args) => recognize::recognize_image(args).await,
        Commands::Video(args) => recognize::recognize_video(args).await,
    }
}
