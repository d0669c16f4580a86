// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for PaddleOCR

use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

/// Longest side limit for the detection input
pub const DET_LIMIT_SIDE: u32 = 960;

/// Detection input sides are multiples of this stride
pub const DET_STRIDE: u32 = 32;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 48;

/// Minimum padded width of the recognition input
pub const REC_MIN_WIDTH: u32 = 320;

/// Angle classifier input height
pub const CLS_INPUT_HEIGHT: u32 = 48;

/// Angle classifier input width
pub const CLS_INPUT_WIDTH: u32 = 192;

/// Mean values for detection normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for detection normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Mean/std used by the classifier and recognizer, mapping pixels to `[-1, 1]`
const HALF: [f32; 3] = [0.5, 0.5, 0.5];

/// Ratios between the detection input and the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetScale {
    pub ratio_w: f32,
    pub ratio_h: f32,
}

/// Preprocess an image for text detection
///
/// Steps:
/// 1. Shrink so the longest side is at most DET_LIMIT_SIDE
/// 2. Round both sides to multiples of DET_STRIDE
/// 3. Normalize with ImageNet mean/std into an NCHW tensor
pub fn preprocess_for_detection(image: &RgbImage) -> (Array4<f32>, DetScale) {
    let (w, h) = image.dimensions();
    let (new_w, new_h) = detection_size(w, h);
    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    let scale = DetScale {
        ratio_w: new_w as f32 / w.max(1) as f32,
        ratio_h: new_h as f32 / h.max(1) as f32,
    };
    (normalize_nchw(&resized, new_w, MEAN, STD), scale)
}

/// Detection input size for a `w x h` source
pub fn detection_size(w: u32, h: u32) -> (u32, u32) {
    let longest = w.max(h).max(1);
    let ratio = if longest > DET_LIMIT_SIDE {
        DET_LIMIT_SIDE as f32 / longest as f32
    } else {
        1.0
    };

    let round = |side: u32| -> u32 {
        let scaled = (side as f32 * ratio).round() as u32;
        (((scaled + DET_STRIDE / 2) / DET_STRIDE) * DET_STRIDE).max(DET_STRIDE)
    };
    (round(w), round(h))
}

/// Preprocess a text line for the angle classifier
///
/// Height is fixed; width follows the aspect ratio up to CLS_INPUT_WIDTH and
/// the remainder is zero padded.
pub fn preprocess_for_classifier(image: &RgbImage) -> Array4<f32> {
    let width = scaled_width(image, CLS_INPUT_HEIGHT).min(CLS_INPUT_WIDTH);
    let resized = image::imageops::resize(image, width, CLS_INPUT_HEIGHT, FilterType::Triangle);
    normalize_nchw(&resized, CLS_INPUT_WIDTH, HALF, HALF)
}

/// Preprocess a text line for recognition
///
/// Height is fixed at REC_INPUT_HEIGHT. The padded width is the larger of
/// REC_MIN_WIDTH and the line's own aspect-preserving width.
pub fn preprocess_for_recognition(image: &RgbImage) -> Array4<f32> {
    let width = scaled_width(image, REC_INPUT_HEIGHT);
    let padded = width.max(REC_MIN_WIDTH);
    let resized = image::imageops::resize(image, width, REC_INPUT_HEIGHT, FilterType::Triangle);
    normalize_nchw(&resized, padded, HALF, HALF)
}

fn scaled_width(image: &RgbImage, target_h: u32) -> u32 {
    let (w, h) = image.dimensions();
    let ratio = w as f32 / h.max(1) as f32;
    ((target_h as f32 * ratio).ceil() as u32).max(1)
}

/// Build `[1, 3, H, padded_w]` with `(v/255 - mean) / std`; columns past the image stay zero
fn normalize_nchw(image: &RgbImage, padded_w: u32, mean: [f32; 3], std: [f32; 3]) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let mut tensor = Array4::zeros((1, 3, h as usize, padded_w.max(w) as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            let normalized = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
            tensor[[0, c, y as usize, x as usize]] = normalized;
        }
    }

    tensor
}
