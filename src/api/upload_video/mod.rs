// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Video upload endpoint module
//!
//! Provides POST /upload_video for annotating a video and listing its plates.

pub mod handler;
pub mod response;

pub use handler::upload_video_handler;
pub use response::VideoUploadResponse;
