// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate detection stage: pick the best candidate, crop it and outline it

use anyhow::Result;
use image::RgbImage;
use std::sync::Arc;
use tracing::debug;

use crate::vision::{Annotator, PlateBox, PlateLocator};

/// Result of one detection pass
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    /// Crop of the best plate, if any survived
    pub crop: Option<RgbImage>,
    /// Copy of the frame, outlined when a plate was found
    pub annotated: RgbImage,
    pub best: Option<PlateBox>,
}

/// Highest-confidence candidate whose integer box is non-empty; ties keep the first
pub fn select_best(candidates: &[PlateBox]) -> Option<PlateBox> {
    select_best_within(candidates, (u32::MAX, u32::MAX))
}

/// Like [`select_best`], but boxes are clamped to a `(width, height)` frame
/// before the emptiness check
pub fn select_best_within(candidates: &[PlateBox], bounds: (u32, u32)) -> Option<PlateBox> {
    let mut best: Option<PlateBox> = None;
    let mut best_conf = 0.0f32;

    for candidate in candidates {
        if candidate.is_degenerate() || pixel_rect(candidate, bounds).is_none() {
            debug!("Discarding degenerate plate box {:?}", candidate);
            continue;
        }
        if candidate.confidence > best_conf {
            best_conf = candidate.confidence;
            best = Some(*candidate);
        }
    }

    best
}

/// Truncated, clamped pixel rectangle `(x, y, width, height)` of a box
fn pixel_rect(plate: &PlateBox, (w, h): (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let x1 = (plate.x1.max(0.0) as u32).min(w);
    let y1 = (plate.y1.max(0.0) as u32).min(h);
    let x2 = (plate.x2.max(0.0) as u32).min(w);
    let y2 = (plate.y2.max(0.0) as u32).min(h);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some((x1, y1, x2 - x1, y2 - y1))
}

/// Integer crop of a box, `None` when it rounds down to nothing
pub fn crop_plate(frame: &RgbImage, plate: &PlateBox) -> Option<RgbImage> {
    let (x, y, width, height) = pixel_rect(plate, frame.dimensions())?;
    Some(image::imageops::crop_imm(frame, x, y, width, height).to_image())
}

/// Wraps a [`PlateLocator`] with selection, cropping and outlining
#[derive(Clone)]
pub struct PlateDetector {
    locator: Arc<dyn PlateLocator>,
    annotator: Annotator,
}

impl PlateDetector {
    pub fn new(locator: Arc<dyn PlateLocator>, annotator: Annotator) -> Self {
        Self { locator, annotator }
    }

    /// Locate the best plate in a frame
    ///
    /// Model errors propagate unchanged. When no usable box survives, the
    /// frame comes back unannotated.
    pub fn detect(&self, frame: &RgbImage) -> Result<DetectionOutcome> {
        let candidates = self.locator.locate(frame)?;
        let mut annotated = frame.clone();

        let selected = select_best_within(&candidates, frame.dimensions())
            .and_then(|best| crop_plate(frame, &best).map(|crop| (best, crop)));

        let Some((best, crop)) = selected else {
            debug!("No plate among {} candidates", candidates.len());
            return Ok(DetectionOutcome {
                crop: None,
                annotated,
                best: None,
            });
        };

        debug!(
            "Best plate at ({:.0},{:.0})-({:.0},{:.0}) confidence {:.3}",
            best.x1, best.y1, best.x2, best.y2, best.confidence
        );
        self.annotator.draw_plate_box(&mut annotated, &best);

        Ok(DetectionOutcome {
            crop: Some(crop),
            annotated,
            best: Some(best),
        })
    }
}
