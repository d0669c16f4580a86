// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing for the plate detector

use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::Array4;

/// Square input size of the YOLO plate detector
pub const DETECTOR_INPUT_SIZE: u32 = 640;

/// Padding colour used by the YOLO training letterbox
pub const LETTERBOX_FILL: u8 = 114;

/// Scale and padding applied by [`letterbox`]
///
/// Needed to map model-space boxes back onto the original frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Map a point from model input space back to frame coordinates
    pub fn map_to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Resize a frame into a padded `target x target` square, preserving aspect ratio
pub fn letterbox(frame: &RgbImage, target: u32) -> (RgbImage, Letterbox) {
    let (w, h) = frame.dimensions();
    let mut canvas = RgbImage::from_pixel(target, target, Rgb([LETTERBOX_FILL; 3]));

    if w == 0 || h == 0 {
        return (
            canvas,
            Letterbox {
                scale: 1.0,
                pad_x: 0.0,
                pad_y: 0.0,
            },
        );
    }

    let scale = (target as f32 / w as f32).min(target as f32 / h as f32);
    let new_w = ((w as f32 * scale).round() as u32).clamp(1, target);
    let new_h = ((h as f32 * scale).round() as u32).clamp(1, target);
    let pad_x = (target - new_w) / 2;
    let pad_y = (target - new_h) / 2;

    let resized = image::imageops::resize(frame, new_w, new_h, FilterType::Triangle);
    image::imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);

    (
        canvas,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

/// Build the `[1, 3, H, W]` tensor scaled to `[0, 1]`
pub fn to_nchw_unit(image: &RgbImage) -> Array4<f32> {
    let (w, h) = image.dimensions();
    let mut tensor = Array4::zeros((1, 3, h as usize, w as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
        }
    }
    tensor
}
