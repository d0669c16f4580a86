// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Video upload handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{error, info, warn};

use super::response::VideoUploadResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::uploads::{
    allowed_file, read_file_field, storage_name, INVALID_FILE_TYPE, PROCESSED_PREFIX,
    VIDEO_EXTENSIONS,
};
use crate::pipeline::PipelineError;

pub const VIDEO_FIELD: &str = "video";

pub const NO_VIDEO_PROVIDED: &str = "No video provided";
pub const NO_PLATES_DETECTED: &str = "No plates detected in video";

/// POST /upload_video - Annotate a video and list the plates seen in it
///
/// The annotated copy is stored as `processed_<name>` in the upload
/// directory and served from `GET /uploads/{filename}`. It is written even
/// when no plate is found.
///
/// # Errors
/// - 400 Bad Request: missing `video` field, disallowed extension, or no
///   plate read in any frame
/// - 500 Internal Server Error: the video could not be opened, decoded or
///   written
pub async fn upload_video_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VideoUploadResponse>, ApiError> {
    let upload = read_file_field(&mut multipart, &[VIDEO_FIELD])
        .await?
        .ok_or_else(|| {
            warn!("Video upload rejected: no video field");
            ApiError::BadRequest(NO_VIDEO_PROVIDED.to_string())
        })?;

    if upload.file_name.is_empty() || !allowed_file(&upload.file_name, VIDEO_EXTENSIONS) {
        warn!("Video upload rejected: invalid file type {:?}", upload.file_name);
        return Err(ApiError::BadRequest(INVALID_FILE_TYPE.to_string()));
    }

    let name = storage_name(&upload.file_name);
    let input = state.uploads.save(&name, &upload.bytes).await.map_err(|e| {
        error!("Failed to store video {}: {}", name, e);
        ApiError::InternalError(PipelineError::Io(e).to_string())
    })?;

    let output_name = format!("{}{}", PROCESSED_PREFIX, name);
    let output = state.uploads.path_for(&output_name);

    let pipeline = state.video_pipeline.clone();
    let report = tokio::task::spawn_blocking(move || pipeline.process_video(&input, &output))
        .await
        .unwrap_or_else(|e| Err(PipelineError::TaskFailed(e.to_string())))
        .map_err(|e| {
            error!("Error processing video {}: {}", name, e);
            ApiError::InternalError(e.to_string())
        })?;

    if !report.success {
        warn!(
            "No plates detected in video {} ({} frames)",
            name, report.frames_processed
        );
        return Err(ApiError::BadRequest(NO_PLATES_DETECTED.to_string()));
    }

    info!(
        "Video {} processed: {} plates over {} frames",
        name,
        report.plates.len(),
        report.frames_processed
    );

    Ok(Json(VideoUploadResponse {
        video_url: state.uploads.url_for(&output_name),
        detected_plates: report.plates,
    }))
}
