// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text orientation classifier
//!
//! Decides whether a text line is upside down. Lines classified as "180"
//! with high confidence are rotated before recognition.

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::ArrayViewD;
use ort::value::Value;
use std::path::Path;
use tracing::{debug, info};

use super::preprocessing::preprocess_for_classifier;
use crate::vision::session::SharedSession;

/// Minimum "180" score before a line is flipped
pub const ROTATE_THRESHOLD: f32 = 0.9;

/// Orientation of a text line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Upright,
    Rotated180,
}

/// PaddleOCR angle classifier (cls_model.onnx)
#[derive(Clone, Debug)]
pub struct OcrAngleClassifier {
    session: SharedSession,
}

impl OcrAngleClassifier {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading OCR angle classifier from {}", model_path.display());

        let session = SharedSession::load(model_path, "OCR angle classifier", "x")?;

        info!("✅ OCR angle classifier loaded successfully (CPU-only)");
        Ok(Self { session })
    }

    pub fn classify(&self, line: &RgbImage) -> Result<Orientation> {
        let input = preprocess_for_classifier(line);

        let mut session = self.session.lock()?;
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.session.input_name() => input_value])
            .context("Angle classification inference failed")?;

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        orientation_from_scores(scores.view())
    }

    /// Rotate the line when it reads upside down
    pub fn correct(&self, line: RgbImage) -> Result<RgbImage> {
        match self.classify(&line)? {
            Orientation::Upright => Ok(line),
            Orientation::Rotated180 => {
                debug!("Rotating text line by 180 degrees");
                Ok(image::imageops::rotate180(&line))
            }
        }
    }
}

/// Interpret `[1, 2]` label scores ordered `["0", "180"]`
pub fn orientation_from_scores(scores: ArrayViewD<f32>) -> Result<Orientation> {
    let flat: Vec<f32> = scores.iter().copied().collect();
    if flat.len() < 2 {
        anyhow::bail!("Unexpected classifier output shape: {:?}", scores.shape());
    }

    let upside_down = flat[1] > flat[0] && flat[1] > ROTATE_THRESHOLD;
    Ok(if upside_down {
        Orientation::Rotated180
    } else {
        Orientation::Upright
    })
}
