// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Video pipeline: per-frame plate recognition into an annotated copy

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::errors::PipelineError;
use super::plate::{PlatePipeline, PlateStatus};
use crate::media::VideoBackend;

/// Plate numbers in order of first appearance, without duplicates
#[derive(Debug, Clone, Default)]
pub struct UniquePlates {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl UniquePlates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a plate; returns false if it was already present
    pub fn insert(&mut self, plate: &str) -> bool {
        if self.seen.contains(plate) {
            return false;
        }
        self.seen.insert(plate.to_string());
        self.order.push(plate.to_string());
        true
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

/// Summary of one video run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoReport {
    /// False when no plate was read in any frame
    pub success: bool,
    pub plates: Vec<String>,
    pub frames_processed: u64,
    /// Frames whose pipeline run failed and were written unannotated
    pub frames_failed: u64,
}

/// Runs the plate pipeline over every frame of a video
#[derive(Clone)]
pub struct VideoPipeline {
    plates: Arc<PlatePipeline>,
    backend: Arc<dyn VideoBackend>,
}

impl VideoPipeline {
    pub fn new(plates: Arc<PlatePipeline>, backend: Arc<dyn VideoBackend>) -> Self {
        Self { plates, backend }
    }

    /// Annotate `input` into `output` and collect the plates seen
    ///
    /// Failing to open either file is an error. A frame whose pipeline run
    /// fails is logged, counted and written through unannotated. Both
    /// handles are closed on every path.
    pub fn process_video(&self, input: &Path, output: &Path) -> Result<VideoReport, PipelineError> {
        let start = Instant::now();
        let mut source = self.backend.open_input(input)?;
        let info = source.info();
        let mut sink = self.backend.open_output(output, info)?;

        let mut plates = UniquePlates::new();
        let mut frames_processed = 0u64;
        let mut frames_failed = 0u64;

        while let Some(frame) = source.next_frame()? {
            frames_processed += 1;

            match self.plates.process(&frame) {
                Ok(record) => {
                    if record.status == PlateStatus::Recognized {
                        if let Some(plate) = &record.plate_number {
                            if plates.insert(plate) {
                                debug!("New plate {} at frame {}", plate, frames_processed);
                            }
                        }
                    }
                    sink.write_frame(&record.annotated)?;
                }
                Err(e) => {
                    warn!("Frame {} failed, writing it unannotated: {}", frames_processed, e);
                    frames_failed += 1;
                    sink.write_frame(&frame)?;
                }
            }
        }

        drop(source);
        sink.finish()?;

        info!(
            "Processed {} frames ({} failed) in {}ms, {} unique plates",
            frames_processed,
            frames_failed,
            start.elapsed().as_millis(),
            plates.len()
        );

        Ok(VideoReport {
            success: !plates.is_empty(),
            plates: plates.into_vec(),
            frames_processed,
            frames_failed,
        })
    }
}
