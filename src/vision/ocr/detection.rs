// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text detection model
//!
//! This module provides the text detection component of PaddleOCR.
//! It turns the DB probability map into axis-aligned text boxes.

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::value::Value;
use std::path::Path;
use tracing::{debug, info};

use super::preprocessing::{preprocess_for_detection, DetScale};
use crate::vision::session::SharedSession;

/// Binarisation threshold on the probability map
pub const DB_THRESHOLD: f32 = 0.3;

/// Minimum mean probability inside a box
pub const BOX_THRESHOLD: f32 = 0.6;

/// Box expansion ratio applied to shrunk DB regions
pub const UNCLIP_RATIO: f32 = 1.5;

/// Regions with a shorter side (in map pixels) are discarded
const MIN_SIDE: f32 = 3.0;

/// A detected text box in source image coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Mean probability inside the box (0.0-1.0)
    pub confidence: f32,
}

impl TextBox {
    /// Check if this text box is valid (reasonable dimensions)
    pub fn is_valid(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }

    /// Crop the box out of the image it was detected in
    pub fn crop(&self, image: &RgbImage) -> Option<RgbImage> {
        let (img_w, img_h) = image.dimensions();
        let x = (self.x.max(0.0) as u32).min(img_w);
        let y = (self.y.max(0.0) as u32).min(img_h);
        let w = (self.width.round() as u32).min(img_w - x);
        let h = (self.height.round() as u32).min(img_h - y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(image::imageops::crop_imm(image, x, y, w, h).to_image())
    }
}

/// PaddleOCR text detection model
///
/// Uses the PP-OCR DB detection model to find text regions.
#[derive(Clone, Debug)]
pub struct OcrDetectionModel {
    session: SharedSession,
}

impl OcrDetectionModel {
    /// Load the OCR detection model from a file (det_model.onnx)
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        info!("Loading OCR detection model from {}", model_path.display());

        let session = SharedSession::load(model_path, "OCR detection", "x")?;

        info!("✅ OCR detection model loaded successfully (CPU-only)");
        Ok(Self { session })
    }

    /// Find text boxes, ordered top-to-bottom then left-to-right
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<TextBox>> {
        let (input, scale) = preprocess_for_detection(image);

        let mut session = self.session.lock()?;
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.session.input_name() => input_value])
            .context("Detection inference failed")?;

        let prob_map = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("Detection output shape: {:?}", prob_map.shape());

        let boxes = db_postprocess(prob_map.view(), scale, image.dimensions())?;
        debug!("Detected {} text regions", boxes.len());

        Ok(boxes)
    }
}

/// Convert a DB probability map (`[1, 1, H, W]` or `[1, H, W]`) into text boxes
pub fn db_postprocess(
    output: ArrayViewD<f32>,
    scale: DetScale,
    image_size: (u32, u32),
) -> Result<Vec<TextBox>> {
    let shape = output.shape();
    let (height, width, is_4d) = match shape.len() {
        4 => (shape[2], shape[3], true),
        3 => (shape[1], shape[2], false),
        _ => anyhow::bail!("Unexpected output shape: {:?}", shape),
    };

    let prob = |x: usize, y: usize| -> f32 {
        if is_4d {
            output[IxDyn(&[0, 0, y, x])]
        } else {
            output[IxDyn(&[0, y, x])]
        }
    };

    let (img_w, img_h) = (image_size.0 as f32, image_size.1 as f32);
    let mut visited = vec![false; width * height];
    let mut boxes = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if visited[y * width + x] || prob(x, y) <= DB_THRESHOLD {
                continue;
            }

            let region = flood_fill(&prob, &mut visited, x, y, width, height);
            let (rw, rh) = (
                (region.max_x - region.min_x + 1) as f32,
                (region.max_y - region.min_y + 1) as f32,
            );
            if rw.min(rh) < MIN_SIDE {
                continue;
            }

            let mut score_sum = 0.0;
            for ry in region.min_y..=region.max_y {
                for rx in region.min_x..=region.max_x {
                    score_sum += prob(rx, ry);
                }
            }
            let score = score_sum / (rw * rh);
            if score < BOX_THRESHOLD {
                continue;
            }

            // Grow the shrunk region back out: offset = area * ratio / perimeter
            let offset = rw * rh * UNCLIP_RATIO / (2.0 * (rw + rh));
            let (w, h) = (rw + 2.0 * offset, rh + 2.0 * offset);
            if w.min(h) < MIN_SIDE + 2.0 {
                continue;
            }

            let x1 = ((region.min_x as f32 - offset) / scale.ratio_w).clamp(0.0, img_w);
            let y1 = ((region.min_y as f32 - offset) / scale.ratio_h).clamp(0.0, img_h);
            let x2 = ((region.min_x as f32 - offset + w) / scale.ratio_w).clamp(0.0, img_w);
            let y2 = ((region.min_y as f32 - offset + h) / scale.ratio_h).clamp(0.0, img_h);

            let text_box = TextBox {
                x: x1,
                y: y1,
                width: x2 - x1,
                height: y2 - y1,
                confidence: score,
            };
            if text_box.is_valid() {
                boxes.push(text_box);
            }
        }
    }

    sort_reading_order(&mut boxes);
    Ok(boxes)
}

/// Sort top-to-bottom; boxes on the same row (within 10px) go left-to-right
pub fn sort_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));

    // One bubble pass per box, as PaddleOCR does for near-equal rows
    for i in 0..boxes.len() {
        for j in (0..i).rev() {
            let same_row = (boxes[j + 1].y - boxes[j].y).abs() < 10.0;
            if same_row && boxes[j + 1].x < boxes[j].x {
                boxes.swap(j, j + 1);
            } else {
                break;
            }
        }
    }
}

struct Region {
    min_x: usize,
    max_x: usize,
    min_y: usize,
    max_y: usize,
}

/// 4-connected flood fill over pixels above DB_THRESHOLD
fn flood_fill(
    prob: &impl Fn(usize, usize) -> f32,
    visited: &mut [bool],
    start_x: usize,
    start_y: usize,
    width: usize,
    height: usize,
) -> Region {
    let mut stack = vec![(start_x, start_y)];
    let mut region = Region {
        min_x: start_x,
        max_x: start_x,
        min_y: start_y,
        max_y: start_y,
    };

    while let Some((x, y)) = stack.pop() {
        let idx = y * width + x;
        if visited[idx] || prob(x, y) <= DB_THRESHOLD {
            continue;
        }
        visited[idx] = true;

        region.min_x = region.min_x.min(x);
        region.max_x = region.max_x.max(x);
        region.min_y = region.min_y.min(y);
        region.max_y = region.max_y.max(y);

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }

    region
}
