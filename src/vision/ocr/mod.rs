// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR integration for reading plate text
//!
//! This module provides CPU-based OCR using PaddleOCR ONNX models.
//!
//! Components:
//! - `detection` - Text region detection (DB post-processing)
//! - `classifier` - Optional 0/180 degree orientation check
//! - `recognition` - CTC text recognition from detected regions
//! - `preprocessing` - Image preprocessing for models
//! - `model` - Combined OCR engine

pub mod classifier;
pub mod detection;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use classifier::{OcrAngleClassifier, Orientation};
pub use detection::{OcrDetectionModel, TextBox};
pub use model::PaddleOcrModel;
pub use recognition::{OcrRecognitionModel, RecognizedText};
