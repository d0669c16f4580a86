// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Video upload response types

use serde::{Deserialize, Serialize};

/// Response from a successful `POST /upload_video`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoUploadResponse {
    /// Public URL of the annotated copy
    pub video_url: String,
    /// Distinct plate numbers in order of first appearance
    pub detected_plates: Vec<String>,
}
