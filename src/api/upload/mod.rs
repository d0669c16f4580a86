// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image upload endpoint module
//!
//! Provides POST /upload for recognising the plate in a single image.

pub mod handler;
pub mod response;

pub use handler::upload_handler;
pub use response::UploadResponse;
