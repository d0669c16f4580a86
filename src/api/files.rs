// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /uploads/{filename} - serve stored uploads and processed videos

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::http_server::AppState;
use super::uploads::mime_for;

pub const FILE_NOT_FOUND: &str = "File not found";

pub async fn uploaded_file_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    let Some(path) = state.uploads.resolve(&filename) else {
        debug!("Requested upload {} not found", filename);
        return (StatusCode::NOT_FOUND, FILE_NOT_FOUND).into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, mime_for(&filename))], bytes).into_response(),
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            (StatusCode::NOT_FOUND, FILE_NOT_FOUND).into_response()
        }
    }
}
