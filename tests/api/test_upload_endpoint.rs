// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /upload tests
//!
//! Input validation happens before the pipeline runs; every accepted file
//! gets HTTP 200 and the outcome is told apart by the body fields.

use axum::http::StatusCode;
use lpr_node::vision::{encode_png, MAX_IMAGE_BYTES};
use tower::util::ServiceExt;

use crate::common::{body_json, frame, multipart_request, test_app, test_app_with_limit, ScriptedPlates};

fn png(index: u8) -> Vec<u8> {
    encode_png(&frame(index)).unwrap()
}

#[tokio::test]
async fn test_upload_recognizes_plate() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123"));

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "car.png", &png(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["plate_number"], "ABC123");
    assert!(body["detected_plate"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(body["original_image"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(body.get("error").is_none());
    assert!(t.uploads.join("car.png").is_file());
}

#[tokio::test]
async fn test_upload_accepts_image_field() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123"));

    let response = t
        .app
        .oneshot(multipart_request("/upload", "image", "car.jpg", &png(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["plate_number"], "ABC123");
}

#[tokio::test]
async fn test_upload_without_plate() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "empty.png", &png(0)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["plate_number"], "No license plate detected");
    assert_eq!(body["message"], "No license plate detected in the image");
    assert!(body.get("detected_plate").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_upload_unreadable_plate() {
    let t = test_app(ScriptedPlates::new().plate(3, ""));

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "blurry.png", &png(3)))
        .await
        .unwrap();

    let body = body_json(response).await;
    assert!(body["plate_number"].is_null());
    assert_eq!(body["message"], "License plate detected but text could not be read");
    assert!(body["detected_plate"].is_string());
}

#[tokio::test]
async fn test_model_failure_is_processing_error_not_missing_plate() {
    let t = test_app(ScriptedPlates::new().failing(7));

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "car.png", &png(7)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Error processing image");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("simulated detector failure"));
    assert!(body.get("plate_number").is_none());
}

#[tokio::test]
async fn test_corrupt_image_is_processing_error() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "car.png", b"not really a png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Error processing image");
    assert_eq!(t.script.locate_calls(), 0);
}

#[tokio::test]
async fn test_exe_rejected_before_pipeline() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123"));

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "malware.exe", &png(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid file type");
    assert_eq!(t.script.locate_calls(), 0);
    assert!(!t.uploads.join("malware.exe").exists());
}

#[tokio::test]
async fn test_missing_file_part() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload", "document", "car.png", &png(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No file part");
}

#[tokio::test]
async fn test_empty_filename() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "", &png(1)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No selected file");
}

#[tokio::test]
async fn test_filename_is_sanitised() {
    let t = test_app(ScriptedPlates::new());

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "../../my car.png", &png(0)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(t.uploads.join("my_car.png").is_file());
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let t = test_app_with_limit(ScriptedPlates::new(), 1024);

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "big.png", &vec![0u8; 64 * 1024]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(t.script.locate_calls(), 0);
}

#[tokio::test]
async fn test_image_over_decode_limit_rejected_within_body_limit() {
    let t = test_app_with_limit(ScriptedPlates::new(), MAX_IMAGE_BYTES + 1024 * 1024);
    let mut bytes = png(1);
    bytes.resize(MAX_IMAGE_BYTES + 1, 0);

    let response = t
        .app
        .oneshot(multipart_request("/upload", "file", "huge.png", &bytes))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("too large"));
    assert_eq!(t.script.locate_calls(), 0);
    assert!(!t.uploads.join("huge.png").exists());
}
