// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO license plate detector
//!
//! Wraps a YOLOv8-style ONNX export trained on license plates. The model
//! emits `[1, 4 + classes, anchors]` (or the transposed layout) where each
//! anchor carries `cx, cy, w, h` in letterboxed input space followed by one
//! score per class.

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::value::Value;
use std::path::Path;
use tracing::{debug, info};

use super::preprocessing::{letterbox, to_nchw_unit, Letterbox, DETECTOR_INPUT_SIZE};
use crate::vision::session::SharedSession;
use crate::vision::{PlateBox, PlateLocator};

/// Default confidence threshold for plate candidates
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// ONNX plate detector
#[derive(Clone, Debug)]
pub struct YoloPlateModel {
    session: SharedSession,
    confidence_threshold: f32,
}

impl YoloPlateModel {
    /// Load the detector from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading plate detector from {}", model_path.display());

        let session = SharedSession::load(model_path, "Plate detector", "images")?;

        info!("✅ Plate detector loaded (CPU-only)");
        Ok(Self {
            session,
            confidence_threshold: DEFAULT_CONFIDENCE,
        })
    }

    /// Set the confidence threshold for candidates
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }
}

impl PlateLocator for YoloPlateModel {
    fn locate(&self, frame: &RgbImage) -> Result<Vec<PlateBox>> {
        let (boxed, info) = letterbox(frame, DETECTOR_INPUT_SIZE);
        let input = to_nchw_unit(&boxed);

        let mut session = self.session.lock()?;
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.session.input_name() => input_value])
            .context("Plate detection inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract detector output")?;
        debug!("Detector output shape: {:?}", output.shape());

        let candidates = parse_detections(
            output.view(),
            &info,
            frame.dimensions(),
            self.confidence_threshold,
        )?;
        debug!("{} plate candidates above {}", candidates.len(), self.confidence_threshold);

        Ok(candidates)
    }
}

/// Decode raw detector output into frame-space candidates
///
/// Candidates keep model output order. Boxes are clamped to the frame, so a
/// box lying entirely outside it comes back degenerate.
pub fn parse_detections(
    output: ArrayViewD<f32>,
    letterbox: &Letterbox,
    frame_size: (u32, u32),
    threshold: f32,
) -> Result<Vec<PlateBox>> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 {
        anyhow::bail!("Unexpected detector output shape: {:?}", shape);
    }

    // Anchors outnumber attributes in every YOLO export
    let transposed = shape[1] > shape[2];
    let (attrs, anchors) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if attrs < 5 {
        anyhow::bail!("Detector output has {} attributes, expected at least 5", attrs);
    }

    let at = |attr: usize, anchor: usize| -> f32 {
        if transposed {
            output[IxDyn(&[0, anchor, attr])]
        } else {
            output[IxDyn(&[0, attr, anchor])]
        }
    };

    let (frame_w, frame_h) = (frame_size.0 as f32, frame_size.1 as f32);
    let mut candidates = Vec::new();

    for anchor in 0..anchors {
        let confidence = (4..attrs)
            .map(|attr| at(attr, anchor))
            .fold(f32::MIN, f32::max);
        if confidence < threshold {
            continue;
        }

        let (cx, cy, w, h) = (at(0, anchor), at(1, anchor), at(2, anchor), at(3, anchor));
        let (x1, y1) = letterbox.map_to_frame(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = letterbox.map_to_frame(cx + w / 2.0, cy + h / 2.0);

        candidates.push(PlateBox::new(
            x1.clamp(0.0, frame_w),
            y1.clamp(0.0, frame_h),
            x2.clamp(0.0, frame_w),
            y2.clamp(0.0, frame_h),
            confidence.clamp(0.0, 1.0),
        ));
    }

    Ok(candidates)
}
