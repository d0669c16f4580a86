// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Video pipeline tests over the in-memory backend

use lpr_node::pipeline::{PipelineError, VideoPipeline};
use std::path::PathBuf;
use std::sync::Arc;

use crate::common::{frame, plate_pipeline, MemoryBackend, ScriptedPlates};

struct VideoFixture {
    pipeline: VideoPipeline,
    backend: Arc<MemoryBackend>,
    dir: tempfile::TempDir,
}

impl VideoFixture {
    fn new(script: ScriptedPlates) -> Self {
        let script = Arc::new(script);
        let backend = Arc::new(MemoryBackend::default());
        Self {
            pipeline: VideoPipeline::new(plate_pipeline(&script), backend.clone()),
            backend,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn input(&self, name: &str, frames: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, frames).unwrap();
        path
    }

    fn output(&self) -> PathBuf {
        self.dir.path().join("processed.mp4")
    }
}

#[test]
fn test_plates_deduplicated_in_first_seen_order() {
    let fixture = VideoFixture::new(ScriptedPlates::new().plate(1, "ABC123").plate(2, "XYZ999"));
    // plates at frames 2, 5 and 6 (0-based)
    let input = fixture.input("clip.mp4", &[0, 0, 1, 0, 0, 2, 1, 0]);

    let report = fixture.pipeline.process_video(&input, &fixture.output()).unwrap();

    assert!(report.success);
    assert_eq!(report.plates, vec!["ABC123", "XYZ999"]);
    assert_eq!(report.frames_processed, 8);
    assert_eq!(report.frames_failed, 0);
    assert_eq!(fixture.backend.written_frames().len(), 8);
    assert!(fixture.output().is_file());
}

#[test]
fn test_no_plates_reports_failure_and_still_writes_output() {
    let fixture = VideoFixture::new(ScriptedPlates::new().plate(3, ""));
    let input = fixture.input("clip.mp4", &[0, 3, 0]);

    let report = fixture.pipeline.process_video(&input, &fixture.output()).unwrap();

    assert!(!report.success);
    assert!(report.plates.is_empty());
    assert_eq!(report.frames_processed, 3);
    assert!(fixture.output().is_file());
}

/// Failing frames are skipped and written through unannotated; the rest of
/// the video is still processed.
#[test]
fn test_failing_frame_is_isolated() {
    let fixture = VideoFixture::new(
        ScriptedPlates::new()
            .plate(1, "ABC123")
            .plate(2, "XYZ999")
            .failing(9),
    );
    let input = fixture.input("clip.mp4", &[1, 9, 2]);

    let report = fixture.pipeline.process_video(&input, &fixture.output()).unwrap();

    assert_eq!(report.plates, vec!["ABC123", "XYZ999"]);
    assert_eq!(report.frames_processed, 3);
    assert_eq!(report.frames_failed, 1);

    let written = fixture.backend.written_frames();
    assert_eq!(written.len(), 3);
    assert_eq!(written[1], frame(9));
    assert_ne!(written[0], frame(1));
}

#[test]
fn test_unopenable_input_is_an_error() {
    let fixture = VideoFixture::new(ScriptedPlates::new());
    let input = fixture.input("broken.mp4", &[1]);

    let result = fixture.pipeline.process_video(&input, &fixture.output());

    assert!(matches!(result, Err(PipelineError::Video(_))));
    assert!(fixture.backend.written_frames().is_empty());
}

#[test]
fn test_empty_video() {
    let fixture = VideoFixture::new(ScriptedPlates::new());
    let input = fixture.input("clip.mp4", &[]);

    let report = fixture.pipeline.process_video(&input, &fixture.output()).unwrap();

    assert!(!report.success);
    assert_eq!(report.frames_processed, 0);
}
