// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload storage: filename policy, multipart reading and the upload directory

use axum::body::Bytes;
use axum_extra::extract::Multipart;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use super::errors::ApiError;

/// Extensions accepted by `POST /upload`
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions accepted by `POST /upload_video`
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// Prefix of annotated outputs written next to the uploads
pub const PROCESSED_PREFIX: &str = "processed_";

pub const INVALID_FILE_TYPE: &str = "Invalid file type";

/// Lowercased extension after the last dot, if any
pub fn extension_of(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether `filename` carries one of `allowed` as its extension
pub fn allowed_file(filename: &str, allowed: &[&str]) -> bool {
    extension_of(filename).is_some_and(|ext| allowed.contains(&ext.as_str()))
}

/// Reduce a client filename to a safe flat name
///
/// Non-ASCII characters are dropped, path separators become spaces, runs of
/// whitespace become `_`, only `[A-Za-z0-9_.-]` survive and leading or
/// trailing `.`/`_` are stripped. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Sanitised name for storage
///
/// When sanitising empties the name or eats its extension, a UUID name with
/// the original extension is used instead.
pub fn storage_name(filename: &str) -> String {
    let safe = secure_filename(filename);
    if !safe.is_empty() && extension_of(&safe) == extension_of(filename) {
        return safe;
    }
    match extension_of(filename) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// MIME type for a served file, defaulting to `video/mp4`
pub fn mime_for(filename: &str) -> &'static str {
    match extension_of(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        _ => "video/mp4",
    }
}

/// A file part read from a multipart body
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename, possibly empty
    pub file_name: String,
    pub bytes: Bytes,
}

/// Read the first part named one of `field_names`
///
/// Returns `None` when no such part exists.
pub async fn read_file_field(
    multipart: &mut Multipart,
    field_names: &[&str],
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name() else {
            continue;
        };
        if !field_names.contains(&name) {
            debug!("Skipping multipart field {}", name);
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(UploadedFile { file_name, bytes }));
    }
    Ok(None)
}

fn multipart_error(err: axum_extra::extract::multipart::MultipartError) -> ApiError {
    warn!("Malformed multipart body: {}", err);
    let message = err.body_text();
    if err.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

/// Flat directory holding uploads and processed outputs
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_base_url: String,
}

impl UploadStore {
    /// Open the store, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write an upload under its stored name and return the path
    pub async fn save(&self, name: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.path_for(name);
        tokio::fs::write(&path, bytes).await?;
        debug!("Saved upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Public URL of a stored file
    pub fn url_for(&self, name: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, name)
    }

    /// Locate a previously stored file by client-supplied name
    ///
    /// Only flat names with a servable extension resolve.
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        let safe = secure_filename(requested);
        if safe.is_empty() || safe != requested {
            return None;
        }
        let servable = allowed_file(&safe, IMAGE_EXTENSIONS) || allowed_file(&safe, VIDEO_EXTENSIONS);
        if !servable {
            return None;
        }
        let path = self.path_for(&safe);
        path.is_file().then_some(path)
    }
}
