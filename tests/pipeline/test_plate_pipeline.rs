// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Single-frame pipeline tests against scripted models

use image::{DynamicImage, Rgb, RgbImage};
use lpr_node::pipeline::{select_best, PipelineError, PlatePipeline, PlateStatus, PlateValidator};
use lpr_node::vision::{Annotator, PlateBox, PlateLocator, TextEngine, TextLine};
use std::sync::{Arc, Mutex};

use crate::common::{frame, plate_pipeline, ScriptedPlates};

#[test]
fn test_frame_without_plate_never_errors() {
    let script = Arc::new(ScriptedPlates::new());
    let record = plate_pipeline(&script).process(&frame(0)).unwrap();

    assert_eq!(record.status, PlateStatus::NotDetected);
    assert!(record.plate_number.is_none());
    assert!(record.crop.is_none());
    assert_eq!(record.annotated, frame(0));
}

#[test]
fn test_highest_confidence_box_is_annotated() {
    let script = Arc::new(ScriptedPlates::new().plate(4, "KA01AB1234"));
    let record = plate_pipeline(&script).process(&frame(4)).unwrap();

    assert_eq!(record.status, PlateStatus::Recognized);
    assert_eq!(record.plate_number.as_deref(), Some("KA01AB1234"));
    let best = record.detection.unwrap();
    assert_eq!(best.confidence, 0.9);
    assert_eq!(record.crop.unwrap().dimensions(), (24, 16));
    // box outline drawn in green
    assert_eq!(record.annotated.get_pixel(4, 4), &Rgb([0, 255, 0]));
}

#[test]
fn test_detector_failure_is_an_error() {
    let script = Arc::new(ScriptedPlates::new().failing(9));
    let result = plate_pipeline(&script).process(&frame(9));

    assert!(matches!(result, Err(PipelineError::Detection(_))));
}

#[test]
fn test_select_best_discards_degenerate_boxes() {
    let boxes = [
        PlateBox::new(10.0, 10.0, 5.0, 20.0, 0.99),
        PlateBox::new(0.0, 0.0, 10.0, 10.0, 0.3),
        PlateBox::new(0.0, 0.0, 20.0, 10.0, 0.9),
        PlateBox::new(0.0, 0.0, 30.0, 10.0, 0.5),
    ];
    assert_eq!(select_best(&boxes), Some(boxes[2]));
}

#[test]
fn test_select_best_ignores_box_thinner_than_a_pixel() {
    let boxes = [
        PlateBox::new(5.2, 5.0, 5.8, 9.0, 0.9),
        PlateBox::new(0.0, 0.0, 10.0, 10.0, 0.5),
    ];
    assert_eq!(select_best(&boxes), Some(boxes[1]));
}

/// Records the size of every image the engine is asked to read
struct SizeRecordingEngine {
    sizes: Mutex<Vec<(u32, u32)>>,
}

impl TextEngine for SizeRecordingEngine {
    fn read_lines(&self, image: &RgbImage) -> anyhow::Result<Vec<TextLine>> {
        self.sizes.lock().unwrap().push(image.dimensions());
        Ok(vec![TextLine::new("mh12", 0.9), TextLine::new("de 1433", 0.8)])
    }
}

struct FixedLocator(Vec<PlateBox>);

impl PlateLocator for FixedLocator {
    fn locate(&self, _frame: &RgbImage) -> anyhow::Result<Vec<PlateBox>> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_best_crop_reaches_recognizer_upscaled() {
    let engine = Arc::new(SizeRecordingEngine {
        sizes: Mutex::new(Vec::new()),
    });
    let locator = FixedLocator(vec![
        PlateBox::new(0.0, 0.0, 10.0, 10.0, 0.3),
        PlateBox::new(5.0, 5.0, 45.0, 25.0, 0.9),
        PlateBox::new(0.0, 0.0, 30.0, 30.0, 0.5),
    ]);
    let pipeline = PlatePipeline::new(Arc::new(locator), engine.clone(), Annotator::default())
        .with_validator(Some(PlateValidator::new("[A-Z]{2}[0-9]{2}[A-Z]{2}[0-9]{4}").unwrap()));

    let record = pipeline
        .process(&RgbImage::from_pixel(64, 48, Rgb([120, 120, 120])))
        .unwrap();

    assert_eq!(*engine.sizes.lock().unwrap(), vec![(80, 40)]);
    assert_eq!(record.plate_number.as_deref(), Some("mh12 de 1433"));
    let validation = record.validation.unwrap();
    assert!(validation.valid);
    assert_eq!(validation.normalized, "MH12DE1433");
}

#[test]
fn test_gray_and_rgb_crops_preprocess_identically() {
    let gray = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(12, 6, image::Luma([80])));
    let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 6, Rgb([80, 80, 80])));

    let a = lpr_node::pipeline::recognizer::preprocess(&gray);
    let b = lpr_node::pipeline::recognizer::preprocess(&rgb);

    assert_eq!(a, b);
    assert_eq!(a.get_pixel(0, 0), &Rgb([120, 120, 120]));
}
