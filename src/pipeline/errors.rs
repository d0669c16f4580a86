// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pipeline error types

use thiserror::Error;

use crate::media::VideoIoError;
use crate::vision::ImageError;

/// Failures while processing an image or video
///
/// "No plate" and "unreadable plate" are outcomes, not errors; they are
/// reported through [`super::PlateStatus`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Plate detection failed: {0}")]
    Detection(String),

    #[error("Plate recognition failed: {0}")]
    Recognition(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Video(#[from] VideoIoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Processing task failed: {0}")]
    TaskFailed(String),
}

impl PipelineError {
    /// Model errors carry their context chain in the message
    pub fn detection(err: anyhow::Error) -> Self {
        Self::Detection(format!("{:#}", err))
    }

    pub fn recognition(err: anyhow::Error) -> Self {
        Self::Recognition(format!("{:#}", err))
    }
}
