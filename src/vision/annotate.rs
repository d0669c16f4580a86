// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Frame annotation: plate rectangles and plate-number overlays

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{info, warn};

use super::PlateBox;

/// Colour for boxes and text
pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Baseline anchor of the plate-number overlay
pub const TEXT_ANCHOR: (i32, i32) = (10, 30);

/// Overlay glyph height in pixels
pub const TEXT_SCALE: f32 = 32.0;

/// DejaVu Sans Mono Bold, used unless another font is configured
static EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/font.ttf");

fn embedded_font() -> Option<FontArc> {
    match FontArc::try_from_slice(EMBEDDED_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Embedded overlay font is invalid: {}", e);
            None
        }
    }
}

/// Draws detection results onto frames
///
/// Uses the embedded font by default. Without a font, boxes are still
/// drawn and text overlays are skipped.
#[derive(Clone)]
pub struct Annotator {
    font: Option<FontArc>,
    scale: PxScale,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("has_font", &self.font.is_some())
            .field("scale", &self.scale.y)
            .finish()
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(embedded_font())
    }
}

impl Annotator {
    pub fn new(font: Option<FontArc>) -> Self {
        Self {
            font,
            scale: PxScale::from(TEXT_SCALE),
        }
    }

    /// Box-only annotation, no text overlays
    pub fn without_text() -> Self {
        Self::new(None)
    }

    /// Load the overlay font, falling back to the embedded one
    pub fn from_font_path(path: &Path) -> Self {
        let reason = match std::fs::read(path) {
            Ok(bytes) => match FontArc::try_from_vec(bytes) {
                Ok(font) => {
                    info!("Loaded overlay font from {}", path.display());
                    return Self::new(Some(font));
                }
                Err(e) => e.to_string(),
            },
            Err(e) => e.to_string(),
        };
        warn!(
            "Overlay font {} unusable ({}), using embedded font",
            path.display(),
            reason
        );
        Self::default()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw a two-pixel rectangle around a plate
    pub fn draw_plate_box(&self, frame: &mut RgbImage, plate: &PlateBox) {
        let x = plate.x1.round() as i32;
        let y = plate.y1.round() as i32;
        let width = plate.width().round() as u32;
        let height = plate.height().round() as u32;
        if width == 0 || height == 0 {
            return;
        }

        draw_hollow_rect_mut(frame, Rect::at(x, y).of_size(width, height), ANNOTATION_COLOR);
        if width > 2 && height > 2 {
            let inner = Rect::at(x + 1, y + 1).of_size(width - 2, height - 2);
            draw_hollow_rect_mut(frame, inner, ANNOTATION_COLOR);
        }
    }

    /// Draw the plate number with its baseline at [`TEXT_ANCHOR`]
    ///
    /// Returns false when no font is loaded.
    pub fn draw_plate_text(&self, frame: &mut RgbImage, text: &str) -> bool {
        let Some(font) = &self.font else {
            return false;
        };

        let ascent = font.as_scaled(self.scale).ascent().round() as i32;
        let (x, baseline) = TEXT_ANCHOR;
        let top = (baseline - ascent).max(0);

        // Second pass offset by one pixel for a thicker stroke
        for dx in 0..2 {
            draw_text_mut(frame, ANNOTATION_COLOR, x + dx, top, self.scale, font, text);
        }
        true
    }
}
