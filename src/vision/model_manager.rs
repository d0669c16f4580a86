// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the plate detector, OCR engine and overlay font

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::config::NodeConfig;
use crate::vision::annotate::Annotator;
use crate::vision::detector::YoloPlateModel;
use crate::vision::ocr::PaddleOcrModel;
use crate::vision::{PlateLocator, TextEngine};

/// Information about a loaded vision model
#[derive(Debug, Clone, Serialize)]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type (detector, ocr, font)
    pub model_type: String,
    /// Whether the model is available
    pub available: bool,
}

/// Holds the models shared by every request
///
/// Loaded once at startup and handed to pipelines as trait objects.
#[derive(Clone)]
pub struct VisionModelManager {
    locator: Arc<dyn PlateLocator>,
    text_engine: Arc<dyn TextEngine>,
    annotator: Annotator,
    models: Vec<VisionModelInfo>,
}

impl VisionModelManager {
    /// Load every model named in the configuration
    ///
    /// The detector and OCR engine are required. Without a usable configured
    /// font the embedded one is used.
    pub fn load(config: &NodeConfig) -> Result<Self> {
        let detector = YoloPlateModel::new(&config.plate_model_path)
            .with_context(|| {
                format!(
                    "Failed to load plate detector from {}",
                    config.plate_model_path.display()
                )
            })?
            .with_confidence_threshold(config.plate_confidence);

        let ocr = PaddleOcrModel::new(&config.ocr_model_dir).with_context(|| {
            format!(
                "Failed to load PaddleOCR models from {}",
                config.ocr_model_dir.display()
            )
        })?;
        let has_classifier = ocr.has_classifier();

        let annotator = match &config.font_path {
            Some(path) => Annotator::from_font_path(path),
            None => Annotator::default(),
        };

        let models = vec![
            model_info("plate-yolo", "detector", true),
            model_info("paddleocr", "ocr", true),
            model_info("paddleocr-cls", "ocr", has_classifier),
            model_info("overlay-font", "font", annotator.has_font()),
        ];
        info!("✅ Vision models ready");

        Ok(Self {
            locator: Arc::new(detector),
            text_engine: Arc::new(ocr),
            annotator,
            models,
        })
    }

    /// Assemble a manager from already constructed components
    pub fn from_parts(
        locator: Arc<dyn PlateLocator>,
        text_engine: Arc<dyn TextEngine>,
        annotator: Annotator,
    ) -> Self {
        let has_font = annotator.has_font();
        Self {
            locator,
            text_engine,
            annotator,
            models: vec![
                model_info("plate-locator", "detector", true),
                model_info("text-engine", "ocr", true),
                model_info("overlay-font", "font", has_font),
            ],
        }
    }

    pub fn plate_locator(&self) -> Arc<dyn PlateLocator> {
        self.locator.clone()
    }

    pub fn text_engine(&self) -> Arc<dyn TextEngine> {
        self.text_engine.clone()
    }

    pub fn annotator(&self) -> Annotator {
        self.annotator.clone()
    }

    /// List all vision models and whether they are available
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        self.models.clone()
    }
}

fn model_info(name: &str, model_type: &str, available: bool) -> VisionModelInfo {
    VisionModelInfo {
        name: name.to_string(),
        model_type: model_type.to_string(),
        available,
    }
}
