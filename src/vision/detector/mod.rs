// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! License plate localisation
//!
//! Components:
//! - `preprocessing` - Letterbox resize and tensor layout
//! - `yolo` - ONNX detector implementing [`crate::vision::PlateLocator`]

pub mod preprocessing;
pub mod yolo;

pub use preprocessing::{letterbox, Letterbox, DETECTOR_INPUT_SIZE};
pub use yolo::{parse_detections, YoloPlateModel, DEFAULT_CONFIDENCE};
