// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use lpr_node::{
    api::{start_server, AppState},
    config::NodeConfig,
    media::FfmpegBackend,
    version,
    vision::VisionModelManager,
};
use std::{env, sync::Arc};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting {}", version::get_version_string());
    info!("Build: {}", version::VERSION);

    let config = NodeConfig::from_env();
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        anyhow::bail!(e);
    }

    // Models are required; a missing file stops startup.
    let models = VisionModelManager::load(&config)?;
    for model in models.list_models() {
        info!(
            "Model {} ({}): available={}",
            model.name, model.model_type, model.available
        );
    }

    let backend = Arc::new(FfmpegBackend::new(
        config.ffmpeg_bin.clone(),
        config.ffprobe_bin.clone(),
    ));
    let state = AppState::new(&config, &models, backend)?;

    start_server(&config, state).await
}
