// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ffmpeg command line backend
//!
//! Frames travel as packed RGB24 over the child's stdin/stdout. Children are
//! killed and reaped when a reader or writer is dropped early.

use image::RgbImage;
use serde::Deserialize;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, info, warn};

use super::{FrameSink, FrameSource, VideoBackend, VideoInfo, VideoIoError};

/// Codec for annotated output videos
pub const OUTPUT_CODEC: &str = "mpeg4";

/// Video backend backed by the `ffmpeg` and `ffprobe` binaries
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Read width, height and frame rate of the first video stream
    pub fn probe(&self, path: &Path) -> Result<VideoInfo, VideoIoError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height,r_frame_rate",
                "-of",
                "json",
            ])
            .arg(path)
            .output()
            .map_err(|source| VideoIoError::Spawn {
                binary: self.ffprobe.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VideoIoError::Probe {
                path: path.display().to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_probe_output(&output.stdout, path)
    }
}

impl VideoBackend for FfmpegBackend {
    fn open_input(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoIoError> {
        let info = self.probe(path)?;
        info!(
            "Opened video {} ({}x{} @ {:.2} fps)",
            path.display(),
            info.width,
            info.height,
            info.fps
        );

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| VideoIoError::Spawn {
                binary: self.ffmpeg.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            VideoIoError::Read(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "ffmpeg stdout not captured",
            ))
        })?;

        Ok(Box::new(FfmpegReader {
            binary: self.ffmpeg.clone(),
            info,
            child: Some(child),
            stdout,
            frames_read: 0,
        }))
    }

    fn open_output(&self, path: &Path, info: VideoInfo) -> Result<Box<dyn FrameSink>, VideoIoError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{}x{}", info.width, info.height)])
            .args(["-r", &format_fps(info.fps)])
            .args(["-i", "-", "-c:v", OUTPUT_CODEC, "-q:v", "5"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| VideoIoError::Spawn {
                binary: self.ffmpeg.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            VideoIoError::Write(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "ffmpeg stdin not captured",
            ))
        })?;

        debug!("Writing {} video to {}", OUTPUT_CODEC, path.display());
        Ok(Box::new(FfmpegWriter {
            binary: self.ffmpeg.clone(),
            info,
            child: Some(child),
            stdin: Some(stdin),
        }))
    }
}

struct FfmpegReader {
    binary: String,
    info: VideoInfo,
    child: Option<Child>,
    stdout: ChildStdout,
    frames_read: u64,
}

impl FrameSource for FfmpegReader {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, VideoIoError> {
        let mut buffer = vec![0u8; self.info.frame_len()];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.reap()?;
                return Ok(None);
            }
            Err(e) => return Err(VideoIoError::Read(e)),
        }

        self.frames_read += 1;
        let frame = RgbImage::from_raw(self.info.width, self.info.height, buffer).ok_or_else(|| {
            VideoIoError::Read(std::io::Error::new(
                ErrorKind::InvalidData,
                "short frame buffer",
            ))
        })?;
        Ok(Some(frame))
    }
}

impl FfmpegReader {
    /// Wait for the decoder after end of stream; a failed decode before any frame is an error
    fn reap(&mut self) -> Result<(), VideoIoError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(VideoIoError::Read)?;
        if !status.success() && self.frames_read == 0 {
            return Err(VideoIoError::ProcessFailed {
                binary: self.binary.clone(),
                status: status.to_string(),
            });
        }
        if !status.success() {
            warn!("Decoder exited with {} after {} frames", status, self.frames_read);
        }
        Ok(())
    }
}

impl Drop for FfmpegReader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

struct FfmpegWriter {
    binary: String,
    info: VideoInfo,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FrameSink for FfmpegWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), VideoIoError> {
        let expected = (self.info.width, self.info.height);
        if frame.dimensions() != expected {
            return Err(VideoIoError::FrameSize {
                expected,
                actual: frame.dimensions(),
            });
        }

        let stdin = self.stdin.as_mut().ok_or_else(|| {
            VideoIoError::Write(std::io::Error::new(ErrorKind::BrokenPipe, "encoder closed"))
        })?;
        stdin.write_all(frame.as_raw()).map_err(VideoIoError::Write)
    }

    fn finish(mut self: Box<Self>) -> Result<(), VideoIoError> {
        // Closing stdin signals end of input to the encoder
        drop(self.stdin.take());

        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().map_err(VideoIoError::Write)?;
        if !status.success() {
            return Err(VideoIoError::ProcessFailed {
                binary: self.binary.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

/// Parse `ffprobe -of json` output for the first video stream
pub fn parse_probe_output(stdout: &[u8], path: &Path) -> Result<VideoInfo, VideoIoError> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout).map_err(|e| VideoIoError::Probe {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| VideoIoError::NoVideoStream(path.display().to_string()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(VideoIoError::NoVideoStream(path.display().to_string())),
    };

    let rate = stream.r_frame_rate.unwrap_or_default();
    Ok(VideoInfo {
        width,
        height,
        fps: parse_frame_rate(&rate)?,
    })
}

/// Parse `"30000/1001"` or `"25"` into frames per second
pub fn parse_frame_rate(rate: &str) -> Result<f64, VideoIoError> {
    let invalid = || VideoIoError::InvalidFrameRate(rate.to_string());

    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().map_err(|_| invalid())?;
            let den: f64 = den.trim().parse().map_err(|_| invalid())?;
            if den == 0.0 {
                return Err(invalid());
            }
            num / den
        }
        None => rate.trim().parse().map_err(|_| invalid())?,
    };

    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(invalid())
    }
}

fn format_fps(fps: f64) -> String {
    let formatted = format!("{:.3}", fps);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
