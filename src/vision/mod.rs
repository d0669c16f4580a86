// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision models for license plate recognition
//!
//! This module provides:
//! - Plate localisation via a YOLO ONNX export (`detector`)
//! - Text reading via PaddleOCR ONNX models (`ocr`)
//! - Box and text overlays on frames (`annotate`)
//!
//! All models run on CPU. Inference sits behind the [`PlateLocator`] and
//! [`TextEngine`] traits so pipelines can be driven by test doubles.

pub mod annotate;
pub mod detector;
pub mod image_utils;
pub mod model_manager;
pub mod ocr;
pub mod session;

use image::RgbImage;
use serde::Serialize;

pub use annotate::Annotator;
pub use detector::YoloPlateModel;
pub use image_utils::{
    decode_image_bytes, detect_format, encode_png, encode_png_base64, ImageError, ImageInfo,
    MAX_IMAGE_BYTES,
};
pub use model_manager::{VisionModelInfo, VisionModelManager};
pub use ocr::PaddleOcrModel;

/// A candidate plate region in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlateBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
}

impl PlateBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            confidence,
        }
    }

    /// Non-positive width or height
    pub fn is_degenerate(&self) -> bool {
        !(self.x2 > self.x1 && self.y2 > self.y1)
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }
}

/// One line of text read by an OCR engine
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub confidence: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Locates license plate candidates in a frame
#[cfg_attr(test, mockall::automock)]
pub trait PlateLocator: Send + Sync {
    /// Return every candidate above the model's confidence threshold, in model output order
    fn locate(&self, frame: &RgbImage) -> anyhow::Result<Vec<PlateBox>>;
}

/// Reads lines of text from an image
#[cfg_attr(test, mockall::automock)]
pub trait TextEngine: Send + Sync {
    /// Lines ordered top-to-bottom, then left-to-right. Empty when nothing is legible.
    fn read_lines(&self, image: &RgbImage) -> anyhow::Result<Vec<TextLine>>;
}
