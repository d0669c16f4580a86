// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PaddleOCR text recognition model
//!
//! This module provides the text recognition component of PaddleOCR.
//! It recognizes text content from cropped text lines.

use anyhow::{Context, Result};
use image::RgbImage;
use ndarray::{ArrayViewD, IxDyn};
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::preprocessing::preprocess_for_recognition;
use crate::vision::session::SharedSession;

/// Placeholder for the CTC blank at index 0, never emitted
const CTC_BLANK: char = '\0';

/// Recognized text with confidence score
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    /// The recognized text content
    pub text: String,
    /// Mean probability of the emitted characters (0.0-1.0)
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: String, confidence: f32) -> Self {
        Self { text, confidence }
    }

    /// Check if the text is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// PaddleOCR text recognition model
#[derive(Clone)]
pub struct OcrRecognitionModel {
    session: SharedSession,
    /// Character dictionary for CTC decoding
    dictionary: Arc<Vec<char>>,
}

impl std::fmt::Debug for OcrRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRecognitionModel")
            .field("dictionary_size", &self.dictionary.len())
            .field("session", &self.session)
            .finish()
    }
}

impl OcrRecognitionModel {
    /// Load the recognition model (rec_model.onnx) and its character dictionary
    pub fn new<P: AsRef<Path>>(model_path: P, dict_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let dict_path = dict_path.as_ref();

        if !dict_path.exists() {
            anyhow::bail!(
                "OCR character dictionary not found: {}",
                dict_path.display()
            );
        }

        info!(
            "Loading OCR recognition model from {}",
            model_path.display()
        );

        let dictionary = load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

        let session = SharedSession::load(model_path, "OCR recognition", "x")?;

        info!("✅ OCR recognition model loaded successfully (CPU-only)");
        Ok(Self {
            session,
            dictionary: Arc::new(dictionary),
        })
    }

    /// Get the dictionary size, blank and space included
    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize a single text line
    pub fn recognize(&self, line: &RgbImage) -> Result<RecognizedText> {
        let input = preprocess_for_recognition(line);

        let mut session = self.session.lock()?;
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;
        let outputs = session
            .run(ort::inputs![self.session.input_name() => input_value])
            .context("Recognition inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;
        debug!("Recognition output shape: {:?}", output.shape());

        ctc_greedy_decode(output.view(), &self.dictionary)
    }
}

/// Load a PaddleOCR character dictionary
///
/// One character per line. Index 0 is reserved for the CTC blank and a space
/// is appended after the last entry, matching how the models were trained.
pub fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
    let file = File::open(path.as_ref()).with_context(|| {
        format!("Failed to open dictionary: {}", path.as_ref().display())
    })?;

    let reader = BufReader::new(file);
    let mut dictionary = vec![CTC_BLANK];

    for line in reader.lines() {
        let line = line.context("Failed to read dictionary line")?;
        if let Some(ch) = line.trim_end_matches('\r').chars().next() {
            dictionary.push(ch);
        }
    }

    dictionary.push(' ');
    Ok(dictionary)
}

/// CTC greedy (best path) decoding of `[1, T, C]` or `[T, C]` probabilities
///
/// Repeated indices collapse unless separated by a blank. Indices outside
/// the dictionary are skipped.
pub fn ctc_greedy_decode(output: ArrayViewD<f32>, dictionary: &[char]) -> Result<RecognizedText> {
    let shape = output.shape();
    let (seq_len, num_classes, batched) = match shape.len() {
        3 => (shape[1], shape[2], true),
        2 => (shape[0], shape[1], false),
        _ => anyhow::bail!("Unexpected output shape: {:?}", shape),
    };

    let mut text = String::new();
    let mut total_confidence = 0.0f32;
    let mut emitted = 0usize;
    let mut prev_index = 0usize;

    for t in 0..seq_len {
        let mut max_prob = f32::NEG_INFINITY;
        let mut max_index = 0usize;

        for c in 0..num_classes {
            let prob = if batched {
                output[IxDyn(&[0, t, c])]
            } else {
                output[IxDyn(&[t, c])]
            };
            if prob > max_prob {
                max_prob = prob;
                max_index = c;
            }
        }

        if max_index != 0 && max_index != prev_index {
            if let Some(&ch) = dictionary.get(max_index) {
                text.push(ch);
                total_confidence += max_prob;
                emitted += 1;
            }
        }
        prev_index = max_index;
    }

    let confidence = if emitted == 0 {
        0.0
    } else {
        total_confidence / emitted as f32
    };

    Ok(RecognizedText::new(text, confidence))
}
