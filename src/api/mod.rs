// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod files;
pub mod health;
pub mod http_server;
pub mod upload;
pub mod upload_video;
pub mod uploads;

pub use errors::{ApiError, ErrorResponse};
pub use health::HealthResponse;
pub use http_server::{create_app, start_server, AppState};
pub use upload::{upload_handler, UploadResponse};
pub use upload_video::{upload_video_handler, VideoUploadResponse};
pub use uploads::UploadStore;
