// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Video decoding and encoding
//!
//! Pipelines see videos as a [`FrameSource`] of RGB frames and write to a
//! [`FrameSink`]; a [`VideoBackend`] opens both. The default backend drives
//! the `ffmpeg`/`ffprobe` command line tools.

pub mod ffmpeg;

use image::RgbImage;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

pub use ffmpeg::FfmpegBackend;

/// Errors from opening, reading or writing videos
#[derive(Debug, Error)]
pub enum VideoIoError {
    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to probe video {path}: {reason}")]
    Probe { path: String, reason: String },

    #[error("No video stream found in {0}")]
    NoVideoStream(String),

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(String),

    #[error("Failed to read frame: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write frame: {0}")]
    Write(#[source] std::io::Error),

    #[error("Frame size {actual:?} does not match video size {expected:?}")]
    FrameSize {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("{binary} exited with {status}")]
    ProcessFailed { binary: String, status: String },
}

/// Stream properties shared by input and output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoInfo {
    /// Bytes in one packed RGB24 frame
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Decoded frames in arrival order
pub trait FrameSource: Send {
    fn info(&self) -> VideoInfo;

    /// Next frame, or `None` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbImage>, VideoIoError>;
}

/// Encoder accepting frames of a fixed size
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), VideoIoError>;

    /// Flush and close the output file
    fn finish(self: Box<Self>) -> Result<(), VideoIoError>;
}

/// Opens frame sources and sinks for files on disk
pub trait VideoBackend: Send + Sync {
    fn open_input(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoIoError>;

    fn open_output(&self, path: &Path, info: VideoInfo) -> Result<Box<dyn FrameSink>, VideoIoError>;
}
