// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fakes for integration tests
//!
//! Frames carry an index in every pixel's red channel. `ScriptedPlates`
//! decides per index whether a plate is found, what it reads, or whether
//! the detector fails. Videos handled by `MemoryBackend` are files with one
//! byte per frame.
#![allow(dead_code)]

use anyhow::anyhow;
use axum::{body::Body, http::Request, Router};
use image::{Rgb, RgbImage};
use lpr_node::api::{create_app, AppState, UploadStore};
use lpr_node::media::{FrameSink, FrameSource, VideoBackend, VideoInfo, VideoIoError};
use lpr_node::pipeline::PlatePipeline;
use lpr_node::vision::{Annotator, PlateBox, PlateLocator, TextEngine, TextLine};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const FRAME_WIDTH: u32 = 32;
pub const FRAME_HEIGHT: u32 = 24;
pub const BOUNDARY: &str = "lprtestboundary";

pub fn frame(index: u8) -> RgbImage {
    RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgb([index, 0, 0]))
}

#[derive(Default)]
pub struct ScriptedPlates {
    plates: HashMap<u8, String>,
    failing: HashSet<u8>,
    current: Mutex<Option<u8>>,
    locate_calls: AtomicUsize,
}

impl ScriptedPlates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames with this index show a plate reading `text`; empty text is unreadable
    pub fn plate(mut self, index: u8, text: &str) -> Self {
        self.plates.insert(index, text.to_string());
        self
    }

    /// Frames with this index make the detector fail
    pub fn failing(mut self, index: u8) -> Self {
        self.failing.insert(index);
        self
    }

    pub fn locate_calls(&self) -> usize {
        self.locate_calls.load(Ordering::SeqCst)
    }
}

pub struct FakeLocator(pub Arc<ScriptedPlates>);

impl PlateLocator for FakeLocator {
    fn locate(&self, frame: &RgbImage) -> anyhow::Result<Vec<PlateBox>> {
        self.0.locate_calls.fetch_add(1, Ordering::SeqCst);
        let index = frame.get_pixel(0, 0)[0];
        if self.0.failing.contains(&index) {
            return Err(anyhow!("simulated detector failure on frame {}", index));
        }
        if !self.0.plates.contains_key(&index) {
            return Ok(vec![]);
        }
        *self.0.current.lock().unwrap() = Some(index);
        Ok(vec![
            PlateBox::new(2.0, 2.0, 10.0, 8.0, 0.4),
            PlateBox::new(4.0, 4.0, 28.0, 20.0, 0.9),
        ])
    }
}

pub struct FakeEngine(pub Arc<ScriptedPlates>);

impl TextEngine for FakeEngine {
    fn read_lines(&self, _image: &RgbImage) -> anyhow::Result<Vec<TextLine>> {
        let index = self.0.current.lock().unwrap().take();
        let text = index
            .and_then(|i| self.0.plates.get(&i))
            .cloned()
            .unwrap_or_default();
        if text.is_empty() {
            return Ok(vec![]);
        }
        Ok(vec![TextLine::new(text, 0.95)])
    }
}

pub fn plate_pipeline(script: &Arc<ScriptedPlates>) -> Arc<PlatePipeline> {
    Arc::new(PlatePipeline::new(
        Arc::new(FakeLocator(script.clone())),
        Arc::new(FakeEngine(script.clone())),
        Annotator::default(),
    ))
}

/// Video backend over one-byte-per-frame files
///
/// Inputs whose file name contains "broken" fail to open. Written frames
/// are kept for inspection and the output file records the frame count.
#[derive(Default)]
pub struct MemoryBackend {
    pub written: Arc<Mutex<Vec<RgbImage>>>,
    pub opened: AtomicUsize,
}

impl MemoryBackend {
    pub fn written_frames(&self) -> Vec<RgbImage> {
        self.written.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

struct MemorySource {
    indices: std::vec::IntoIter<u8>,
}

impl FrameSource for MemorySource {
    fn info(&self) -> VideoInfo {
        VideoInfo {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            fps: 25.0,
        }
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>, VideoIoError> {
        Ok(self.indices.next().map(frame))
    }
}

struct MemorySink {
    path: std::path::PathBuf,
    frames: Vec<RgbImage>,
    written: Arc<Mutex<Vec<RgbImage>>>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), VideoIoError> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), VideoIoError> {
        let MemorySink {
            path,
            frames,
            written,
        } = *self;
        std::fs::write(&path, vec![0u8; frames.len()]).map_err(VideoIoError::Write)?;
        written.lock().unwrap().extend(frames);
        Ok(())
    }
}

impl VideoBackend for MemoryBackend {
    fn open_input(&self, path: &Path) -> Result<Box<dyn FrameSource>, VideoIoError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let name = path.to_string_lossy().to_string();
        if name.contains("broken") {
            return Err(VideoIoError::NoVideoStream(name));
        }
        let indices = std::fs::read(path).map_err(VideoIoError::Read)?;
        Ok(Box::new(MemorySource {
            indices: indices.into_iter(),
        }))
    }

    fn open_output(&self, path: &Path, _info: VideoInfo) -> Result<Box<dyn FrameSink>, VideoIoError> {
        Ok(Box::new(MemorySink {
            path: path.to_path_buf(),
            frames: Vec::new(),
            written: self.written.clone(),
        }))
    }
}

pub struct TestApp {
    pub app: Router,
    pub script: Arc<ScriptedPlates>,
    pub backend: Arc<MemoryBackend>,
    pub uploads: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

pub fn test_app(script: ScriptedPlates) -> TestApp {
    test_app_with_limit(script, 10 * 1024 * 1024)
}

pub fn test_app_with_limit(script: ScriptedPlates, max_upload_bytes: usize) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let uploads = dir.path().join("uploads");
    let script = Arc::new(script);
    let backend = Arc::new(MemoryBackend::default());

    let store = UploadStore::new(&uploads, "http://localhost:5000").unwrap();
    let state = AppState::from_parts(
        plate_pipeline(&script),
        backend.clone(),
        store,
        vec![],
        max_upload_bytes,
    );

    TestApp {
        app: create_app(state),
        script,
        backend,
        uploads,
        _dir: dir,
    }
}

/// Multipart request with a single file part
pub fn multipart_request(uri: &str, field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
