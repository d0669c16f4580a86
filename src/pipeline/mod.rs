// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! License plate recognition pipelines
//!
//! `PlatePipeline` turns one frame into a [`PlateRecord`]; `VideoPipeline`
//! applies it frame by frame and collects distinct plate numbers. Both are
//! blocking and are run on the blocking thread pool by the HTTP layer.

pub mod detector;
pub mod errors;
pub mod plate;
pub mod recognizer;
pub mod validation;
pub mod video;

pub use detector::{select_best, select_best_within, DetectionOutcome, PlateDetector};
pub use errors::PipelineError;
pub use plate::{PlatePipeline, PlateRecord, PlateStatus};
pub use recognizer::PlateRecognizer;
pub use validation::{PlateValidator, ValidationResult};
pub use video::{UniquePlates, VideoPipeline, VideoReport};
