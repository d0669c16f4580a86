// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /uploads/{filename} tests

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::util::ServiceExt;

use crate::common::{body_bytes, multipart_request, test_app, ScriptedPlates};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_processed_video_is_served() {
    let t = test_app(ScriptedPlates::new().plate(1, "ABC123"));

    let upload = t
        .app
        .clone()
        .oneshot(multipart_request("/upload_video", "video", "clip.mp4", &[1, 0, 1]))
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);

    let response = t.app.oneshot(get("/uploads/processed_clip.mp4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(body_bytes(response).await.len(), 3);
}

#[tokio::test]
async fn test_mime_type_follows_extension() {
    let t = test_app(ScriptedPlates::new());
    std::fs::write(t.uploads.join("car.jpg"), b"jpeg").unwrap();
    std::fs::write(t.uploads.join("clip.mov"), b"mov").unwrap();

    let response = t.app.clone().oneshot(get("/uploads/car.jpg")).await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

    let response = t.app.oneshot(get("/uploads/clip.mov")).await.unwrap();
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/quicktime");
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let t = test_app(ScriptedPlates::new());

    let response = t.app.oneshot(get("/uploads/nothing.mp4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await, b"File not found");
}

#[tokio::test]
async fn test_traversal_is_not_found() {
    let t = test_app(ScriptedPlates::new());
    let secret = t.uploads.parent().unwrap().join("secret.mp4");
    std::fs::write(&secret, b"secret").unwrap();

    let response = t.app.oneshot(get("/uploads/..%2Fsecret.mp4")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
