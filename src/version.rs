// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the LPR Node

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-plate-recognition-2025-11-03";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "image-upload",
    "video-upload",
    "yolo-plate-detection",
    "paddleocr-recognition",
    "angle-classification",
    "plate-validation",
    "annotated-output",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("LPR Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
