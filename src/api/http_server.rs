// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::files::uploaded_file_handler;
use super::health::health_handler;
use super::upload::upload_handler;
use super::upload_video::upload_video_handler;
use super::uploads::UploadStore;
use crate::config::NodeConfig;
use crate::media::VideoBackend;
use crate::pipeline::{PlatePipeline, PlateValidator, VideoPipeline};
use crate::vision::{VisionModelInfo, VisionModelManager};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub plate_pipeline: Arc<PlatePipeline>,
    pub video_pipeline: Arc<VideoPipeline>,
    pub uploads: Arc<UploadStore>,
    pub models: Arc<Vec<VisionModelInfo>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire pipelines, upload store and model info from loaded models
    pub fn new(
        config: &NodeConfig,
        models: &VisionModelManager,
        backend: Arc<dyn VideoBackend>,
    ) -> Result<Self> {
        let validator = config
            .plate_pattern
            .as_deref()
            .map(PlateValidator::new)
            .transpose()
            .context("Invalid PLATE_PATTERN")?;

        let plate_pipeline = Arc::new(
            PlatePipeline::from_manager(models)
                .with_debug_crop_path(config.debug_crop_path.clone())
                .with_validator(validator),
        );
        let uploads = UploadStore::new(&config.upload_dir, config.public_base_url.clone())
            .with_context(|| {
                format!(
                    "Failed to create upload directory {}",
                    config.upload_dir.display()
                )
            })?;

        Ok(Self::from_parts(
            plate_pipeline,
            backend,
            uploads,
            models.list_models(),
            config.max_upload_bytes,
        ))
    }

    pub fn from_parts(
        plate_pipeline: Arc<PlatePipeline>,
        backend: Arc<dyn VideoBackend>,
        uploads: UploadStore,
        models: Vec<VisionModelInfo>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            video_pipeline: Arc::new(VideoPipeline::new(plate_pipeline.clone(), backend)),
            plate_pipeline,
            uploads: Arc::new(uploads),
            models: Arc::new(models),
            max_upload_bytes,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .route("/upload_video", post(upload_video_handler))
        .route("/uploads/:filename", get(uploaded_file_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl+C
pub async fn start_server(config: &NodeConfig, state: AppState) -> Result<()> {
    let addr = config
        .bind_addr()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("API server listening on {}", addr);
    info!("Uploads stored in {}", state.uploads.dir().display());

    let app = create_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = signal::ctrl_c().await;
            info!("Shutting down API server");
        })
        .await?;

    Ok(())
}
