// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR engine combining detection, orientation and recognition

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::classifier::OcrAngleClassifier;
use super::detection::OcrDetectionModel;
use super::recognition::OcrRecognitionModel;
use crate::vision::{TextEngine, TextLine};

/// Lines recognised below this confidence are dropped
pub const DROP_SCORE: f32 = 0.5;

pub const DET_MODEL_FILE: &str = "det_model.onnx";
pub const CLS_MODEL_FILE: &str = "cls_model.onnx";
pub const REC_MODEL_FILE: &str = "rec_model.onnx";
pub const DICT_FILE: &str = "en_dict.txt";

/// PaddleOCR model for text extraction
///
/// Combines text detection, the optional angle classifier and recognition
/// for end-to-end OCR. Runs on CPU only.
#[derive(Clone, Debug)]
pub struct PaddleOcrModel {
    detector: OcrDetectionModel,
    classifier: Option<OcrAngleClassifier>,
    recognizer: OcrRecognitionModel,
}

impl PaddleOcrModel {
    /// Load PaddleOCR models from the specified directory
    ///
    /// Expected files:
    /// - det_model.onnx (text detection)
    /// - cls_model.onnx (angle classifier, optional)
    /// - rec_model.onnx (text recognition)
    /// - en_dict.txt (character dictionary)
    pub fn new<P: AsRef<Path>>(model_dir: P) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        info!("Loading PaddleOCR models from {}", model_dir.display());

        let detector = OcrDetectionModel::new(model_dir.join(DET_MODEL_FILE))
            .context("Failed to load OCR detection model")?;
        let recognizer = OcrRecognitionModel::new(
            model_dir.join(REC_MODEL_FILE),
            model_dir.join(DICT_FILE),
        )
        .context("Failed to load OCR recognition model")?;

        let cls_path = model_dir.join(CLS_MODEL_FILE);
        let classifier = if cls_path.exists() {
            Some(OcrAngleClassifier::new(&cls_path).context("Failed to load OCR angle classifier")?)
        } else {
            info!(
                "No angle classifier at {}, orientation correction disabled",
                cls_path.display()
            );
            None
        };

        Ok(Self {
            detector,
            classifier,
            recognizer,
        })
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }
}

impl TextEngine for PaddleOcrModel {
    fn read_lines(&self, image: &RgbImage) -> Result<Vec<TextLine>> {
        let start = Instant::now();
        let boxes = self.detector.detect(image)?;

        let mut lines = Vec::with_capacity(boxes.len());
        for text_box in &boxes {
            let Some(mut crop) = text_box.crop(image) else {
                continue;
            };
            if let Some(classifier) = &self.classifier {
                crop = classifier.correct(crop)?;
            }

            let recognized = self.recognizer.recognize(&crop)?;
            if recognized.is_empty() || recognized.confidence < DROP_SCORE {
                debug!(
                    "Dropping text line {:?} (confidence {:.3})",
                    recognized.text, recognized.confidence
                );
                continue;
            }
            lines.push(TextLine::new(recognized.text.trim(), recognized.confidence));
        }

        debug!(
            "OCR read {} of {} regions in {}ms",
            lines.len(),
            boxes.len(),
            start.elapsed().as_millis()
        );
        Ok(lines)
    }
}
