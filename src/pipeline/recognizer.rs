// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plate recognition stage: crop enhancement and OCR

use anyhow::Result;
use image::{imageops::FilterType, DynamicImage, RgbImage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::vision::TextEngine;

/// Upscale factor applied to crops before OCR
pub const UPSCALE_FACTOR: u32 = 2;

/// Linear contrast gain, `out = clamp(gain * in, 0, 255)`
pub const CONTRAST_GAIN: f32 = 1.5;

/// Enhance a plate crop for OCR
///
/// Single-channel input is expanded to RGB first, so grayscale and colour
/// crops share every later step.
pub fn preprocess(crop: &DynamicImage) -> RgbImage {
    let rgb = crop.to_rgb8();
    let (w, h) = rgb.dimensions();

    let mut upscaled = image::imageops::resize(
        &rgb,
        w * UPSCALE_FACTOR,
        h * UPSCALE_FACTOR,
        FilterType::Triangle,
    );

    for pixel in upscaled.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = (CONTRAST_GAIN * *channel as f32).round().min(255.0) as u8;
        }
    }

    upscaled
}

/// Wraps a [`TextEngine`] with plate-specific preprocessing
#[derive(Clone)]
pub struct PlateRecognizer {
    engine: Arc<dyn TextEngine>,
    debug_crop_path: Option<PathBuf>,
}

impl PlateRecognizer {
    pub fn new(engine: Arc<dyn TextEngine>) -> Self {
        Self {
            engine,
            debug_crop_path: None,
        }
    }

    /// Write enhanced crops that yield no text to `path` for inspection
    pub fn with_debug_crop_path(mut self, path: Option<PathBuf>) -> Self {
        self.debug_crop_path = path;
        self
    }

    /// Read the text fragments on a plate crop, top-to-bottom
    ///
    /// An empty result means the plate was unreadable.
    pub fn recognize(&self, crop: &DynamicImage) -> Result<Vec<String>> {
        let enhanced = preprocess(crop);
        let lines = self.engine.read_lines(&enhanced)?;

        let fragments: Vec<String> = lines
            .into_iter()
            .map(|line| line.text)
            .filter(|text| !text.trim().is_empty())
            .collect();

        if fragments.is_empty() {
            debug!("OCR returned no text for {}x{} crop", crop.width(), crop.height());
            self.dump_crop(&enhanced);
        }

        Ok(fragments)
    }

    /// Save the enhanced crop, as the OCR engine saw it
    fn dump_crop(&self, enhanced: &RgbImage) {
        let Some(path) = &self.debug_crop_path else {
            return;
        };
        match enhanced.save(path) {
            Ok(()) => debug!("Saved unreadable crop to {}", path.display()),
            Err(e) => warn!("Failed to save debug crop to {}: {}", path.display(), e),
        }
    }
}
