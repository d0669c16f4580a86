// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image upload handler

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;
use tracing::{debug, error, info, warn};

use super::response::UploadResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::uploads::{
    allowed_file, read_file_field, storage_name, IMAGE_EXTENSIONS, INVALID_FILE_TYPE,
};
use crate::pipeline::{PipelineError, PlatePipeline, PlateStatus};
use crate::vision::{decode_image_bytes, encode_png_base64, MAX_IMAGE_BYTES};

/// Multipart field names accepted for the image
pub const IMAGE_FIELDS: &[&str] = &["file", "image"];

pub const NO_FILE_PART: &str = "No file part";
pub const NO_SELECTED_FILE: &str = "No selected file";

/// POST /upload - Detect and read the license plate in an image
///
/// # Request
/// Multipart body with the image in field `file` (or `image`); png, jpg
/// and jpeg are accepted.
///
/// # Response
/// Always HTTP 200 once the file is accepted:
/// - plate read: `detected_plate`, `original_image`, `plate_number`,
///   optional `validation_result`
/// - plate unreadable: `plate_number: null` plus `message`
/// - no plate: `original_image`, `plate_number` and `message`
/// - processing failure: `message` and `error`
///
/// # Errors
/// - 400 Bad Request: missing field, empty filename or disallowed extension
/// - 413 Payload Too Large: body over the configured limit, or an image over
///   [`MAX_IMAGE_BYTES`]
pub async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let upload = read_file_field(&mut multipart, IMAGE_FIELDS)
        .await?
        .ok_or_else(|| {
            warn!("Upload rejected: no file part");
            ApiError::BadRequest(NO_FILE_PART.to_string())
        })?;

    if upload.file_name.is_empty() {
        warn!("Upload rejected: empty filename");
        return Err(ApiError::BadRequest(NO_SELECTED_FILE.to_string()));
    }
    if !allowed_file(&upload.file_name, IMAGE_EXTENSIONS) {
        warn!("Upload rejected: invalid file type {}", upload.file_name);
        return Err(ApiError::BadRequest(INVALID_FILE_TYPE.to_string()));
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        warn!(
            "Upload rejected: {} is {} bytes, over the image limit",
            upload.file_name,
            upload.bytes.len()
        );
        return Err(ApiError::PayloadTooLarge(format!(
            "Image is too large: {} bytes (max: {} bytes)",
            upload.bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }

    let name = storage_name(&upload.file_name);
    if let Err(e) = state.uploads.save(&name, &upload.bytes).await {
        error!("Failed to store upload {}: {}", name, e);
        return Ok(Json(UploadResponse::processing_error(
            PipelineError::Io(e).to_string(),
        )));
    }

    let pipeline = state.plate_pipeline.clone();
    let bytes = upload.bytes;
    let result = tokio::task::spawn_blocking(move || process_upload(&pipeline, &bytes))
        .await
        .unwrap_or_else(|e| Err(PipelineError::TaskFailed(e.to_string())));

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Error processing image {}: {}", name, e);
            Ok(Json(UploadResponse::processing_error(e.to_string())))
        }
    }
}

/// Decode, run the plate pipeline and shape the response body
pub fn process_upload(
    pipeline: &PlatePipeline,
    bytes: &[u8],
) -> Result<UploadResponse, PipelineError> {
    let (frame, info) = decode_image_bytes(bytes)?;
    debug!(
        "Decoded upload: {}x{} {:?}, {} bytes",
        info.width, info.height, info.format, info.size_bytes
    );

    let record = pipeline.process(&frame)?;
    let original_image = encode_png_base64(&record.annotated)?;
    let detected_plate = record
        .crop
        .as_ref()
        .map(encode_png_base64)
        .transpose()?
        .unwrap_or_default();

    let response = match record.status {
        PlateStatus::NotDetected => UploadResponse::no_plate(original_image),
        PlateStatus::Unreadable => UploadResponse::unreadable(detected_plate, original_image),
        PlateStatus::Recognized => {
            let plate_number = record.plate_number.unwrap_or_default();
            info!("Upload recognised plate {}", plate_number);
            UploadResponse::recognized(
                detected_plate,
                original_image,
                plate_number,
                record.validation,
            )
        }
    };
    Ok(response)
}
