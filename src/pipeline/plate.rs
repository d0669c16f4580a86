// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-image plate pipeline: detect, recognize, annotate

use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::detector::PlateDetector;
use super::errors::PipelineError;
use super::recognizer::PlateRecognizer;
use super::validation::{PlateValidator, ValidationResult};
use crate::vision::{Annotator, PlateBox, PlateLocator, TextEngine, VisionModelManager};

/// How far a frame got through the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateStatus {
    /// Plate found and read
    Recognized,
    /// Plate found, OCR produced no text
    Unreadable,
    /// No plate in the frame
    NotDetected,
}

/// Output of processing one frame
#[derive(Debug, Clone)]
pub struct PlateRecord {
    pub status: PlateStatus,
    /// Crop of the detected plate
    pub crop: Option<RgbImage>,
    /// Frame with box and plate-number overlay
    pub annotated: RgbImage,
    /// Recognised fragments joined by single spaces
    pub plate_number: Option<String>,
    pub detection: Option<PlateBox>,
    pub validation: Option<ValidationResult>,
}

/// Detect-then-recognize pipeline over single frames
#[derive(Clone)]
pub struct PlatePipeline {
    detector: PlateDetector,
    recognizer: PlateRecognizer,
    annotator: Annotator,
    validator: Option<PlateValidator>,
}

impl PlatePipeline {
    pub fn new(
        locator: Arc<dyn PlateLocator>,
        engine: Arc<dyn TextEngine>,
        annotator: Annotator,
    ) -> Self {
        Self {
            detector: PlateDetector::new(locator, annotator.clone()),
            recognizer: PlateRecognizer::new(engine),
            annotator,
            validator: None,
        }
    }

    /// Build a pipeline over the models held by a manager
    pub fn from_manager(models: &VisionModelManager) -> Self {
        Self::new(models.plate_locator(), models.text_engine(), models.annotator())
    }

    pub fn with_debug_crop_path(mut self, path: Option<PathBuf>) -> Self {
        self.recognizer = self.recognizer.with_debug_crop_path(path);
        self
    }

    pub fn with_validator(mut self, validator: Option<PlateValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Process one frame
    ///
    /// "No plate" and "unreadable plate" are returned as records. Any model
    /// failure is an error so callers never mistake it for an empty frame.
    pub fn process(&self, frame: &RgbImage) -> Result<PlateRecord, PipelineError> {
        let outcome = self
            .detector
            .detect(frame)
            .map_err(PipelineError::detection)?;

        let Some(crop) = outcome.crop else {
            debug!("No license plate detected");
            return Ok(PlateRecord {
                status: PlateStatus::NotDetected,
                crop: None,
                annotated: outcome.annotated,
                plate_number: None,
                detection: None,
                validation: None,
            });
        };

        let fragments = self
            .recognizer
            .recognize(&DynamicImage::ImageRgb8(crop.clone()))
            .map_err(PipelineError::recognition)?;

        if fragments.is_empty() {
            info!("License plate detected but text could not be read");
            return Ok(PlateRecord {
                status: PlateStatus::Unreadable,
                crop: Some(crop),
                annotated: outcome.annotated,
                plate_number: None,
                detection: outcome.best,
                validation: None,
            });
        }

        let plate_number = fragments.join(" ");
        let mut annotated = outcome.annotated;
        self.annotator.draw_plate_text(&mut annotated, &plate_number);

        let validation = self.validator.as_ref().map(|v| v.validate(&plate_number));
        info!("Recognized plate {}", plate_number);

        Ok(PlateRecord {
            status: PlateStatus::Recognized,
            crop: Some(crop),
            annotated,
            plate_number: Some(plate_number),
            detection: outcome.best,
            validation,
        })
    }
}
