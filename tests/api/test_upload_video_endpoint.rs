// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /upload_video tests

use axum::http::StatusCode;
use tower::util::ServiceExt;

use crate::common::{body_json, multipart_request, test_app, ScriptedPlates};

#[tokio::test]
async fn test_video_lists_unique_plates() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123").plate(2, "XYZ999"));

    let response = t
        .app
        .oneshot(multipart_request(
            "/upload_video",
            "video",
            "clip.mp4",
            &[0, 0, 1, 0, 0, 2, 1],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["video_url"],
        "http://localhost:5000/uploads/processed_clip.mp4"
    );
    assert_eq!(body["detected_plates"], serde_json::json!(["ABC123", "XYZ999"]));
    assert!(t.uploads.join("processed_clip.mp4").is_file());
    assert_eq!(t.backend.written_frames().len(), 7);
}

#[tokio::test]
async fn test_video_without_plates_is_bad_request() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload_video", "video", "street.mov", &[0, 0, 0]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No plates detected in video");
    // annotated copy is still written
    assert!(t.uploads.join("processed_street.mov").is_file());
}

#[tokio::test]
async fn test_unopenable_video_is_server_error() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123"));

    let response = t
        .app
        .oneshot(multipart_request("/upload_video", "video", "broken.avi", &[1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("broken.avi"));
}

#[tokio::test]
async fn test_missing_video_field() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload_video", "file", "clip.mp4", &[1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No video provided");
    assert_eq!(t.backend.opened(), 0);
}

#[tokio::test]
async fn test_exe_rejected_before_pipeline() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123"));

    let response = t
        .app
        .oneshot(multipart_request("/upload_video", "video", "clip.exe", &[1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid file type");
    assert_eq!(t.backend.opened(), 0);
    assert_eq!(t.script.locate_calls(), 0);
}

#[tokio::test]
async fn test_image_extension_rejected_for_video() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload_video", "video", "car.png", &[1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid file type");
}

#[tokio::test]
async fn test_empty_video_filename_rejected() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload_video", "video", "", &[1]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid file type");
}
