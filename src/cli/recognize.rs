// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::NodeConfig;
use crate::media::FfmpegBackend;
use crate::pipeline::{PlatePipeline, PlateRecord, PlateValidator, VideoPipeline};
use crate::vision::{decode_image_bytes, VisionModelManager};

/// Arguments for the image command
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Image to read (png, jpg, jpeg)
    pub path: PathBuf,

    /// Write the annotated frame here
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the video command
#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Input video
    pub input: PathBuf,

    /// Annotated output video
    pub output: PathBuf,
}

/// Load configuration and models the same way the server does
fn load_pipeline(config: &NodeConfig) -> Result<PlatePipeline> {
    config.validate().map_err(anyhow::Error::msg)?;
    let models = VisionModelManager::load(config)?;
    let validator = config
        .plate_pattern
        .as_deref()
        .map(PlateValidator::new)
        .transpose()
        .context("Invalid PLATE_PATTERN")?;

    Ok(PlatePipeline::from_manager(&models)
        .with_debug_crop_path(config.debug_crop_path.clone())
        .with_validator(validator))
}

pub fn record_json(record: &PlateRecord) -> serde_json::Value {
    json!({
        "status": record.status,
        "plate_number": record.plate_number,
        "detection": record.detection,
        "validation_result": record.validation,
    })
}

pub async fn recognize_image(args: ImageArgs) -> Result<()> {
    let config = NodeConfig::from_env();

    let record = tokio::task::spawn_blocking(move || -> Result<PlateRecord> {
        let pipeline = load_pipeline(&config)?;
        let bytes = std::fs::read(&args.path)
            .with_context(|| format!("Failed to read {}", args.path.display()))?;
        let (frame, _) = decode_image_bytes(&bytes)?;
        let record = pipeline.process(&frame)?;

        if let Some(out) = &args.out {
            record
                .annotated
                .save(out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            info!("Annotated frame written to {}", out.display());
        }
        Ok(record)
    })
    .await??;

    println!("{}", serde_json::to_string_pretty(&record_json(&record))?);
    Ok(())
}

pub async fn recognize_video(args: VideoArgs) -> Result<()> {
    let config = NodeConfig::from_env();

    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        let pipeline = Arc::new(load_pipeline(&config)?);
        let backend = Arc::new(FfmpegBackend::new(
            config.ffmpeg_bin.clone(),
            config.ffprobe_bin.clone(),
        ));
        let report = VideoPipeline::new(pipeline, backend).process_video(&args.input, &args.output)?;
        info!("Annotated video written to {}", args.output.display());
        Ok(report)
    })
    .await??;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
