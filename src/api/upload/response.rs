// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image upload response types

use serde::Serialize;

use crate::pipeline::ValidationResult;

pub const NO_PLATE_NUMBER: &str = "No license plate detected";
pub const NO_PLATE_MESSAGE: &str = "No license plate detected in the image";
pub const UNREADABLE_MESSAGE: &str = "License plate detected but text could not be read";
pub const PROCESSING_ERROR_MESSAGE: &str = "Error processing image";

/// Response from `POST /upload`
///
/// Always returned with HTTP 200; which fields are present tells the
/// outcome apart.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UploadResponse {
    /// Base64 PNG of the plate crop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_plate: Option<String>,
    /// Base64 PNG of the annotated frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_image: Option<String>,
    /// Present as `null` when a plate was found but unreadable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_result: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn recognized(
        detected_plate: String,
        original_image: String,
        plate_number: String,
        validation_result: Option<ValidationResult>,
    ) -> Self {
        Self {
            detected_plate: Some(detected_plate),
            original_image: Some(original_image),
            plate_number: Some(Some(plate_number)),
            validation_result,
            ..Default::default()
        }
    }

    pub fn unreadable(detected_plate: String, original_image: String) -> Self {
        Self {
            detected_plate: Some(detected_plate),
            original_image: Some(original_image),
            plate_number: Some(None),
            message: Some(UNREADABLE_MESSAGE.to_string()),
            ..Default::default()
        }
    }

    pub fn no_plate(original_image: String) -> Self {
        Self {
            original_image: Some(original_image),
            plate_number: Some(Some(NO_PLATE_NUMBER.to_string())),
            message: Some(NO_PLATE_MESSAGE.to_string()),
            ..Default::default()
        }
    }

    pub fn processing_error(error: impl Into<String>) -> Self {
        Self {
            message: Some(PROCESSING_ERROR_MESSAGE.to_string()),
            error: Some(error.into()),
            ..Default::default()
        }
    }
}
