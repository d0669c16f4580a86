// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from the environment

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default upload limit (200MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Configuration for the plate recognition node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Interface to bind
    pub host: String,
    /// HTTP port
    pub port: u16,
    /// Flat directory for uploaded originals and processed outputs
    pub upload_dir: PathBuf,
    /// Base URL used to build `video_url` links
    pub public_base_url: String,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Plate detector ONNX file
    pub plate_model_path: PathBuf,
    /// Detector confidence threshold
    pub plate_confidence: f32,
    /// Directory with the PaddleOCR ONNX models and dictionary
    pub ocr_model_dir: PathBuf,
    /// TrueType font for plate-number overlays; the embedded font when unset
    pub font_path: Option<PathBuf>,
    /// Where unreadable crops are written, when set
    pub debug_crop_path: Option<PathBuf>,
    /// Regex a normalised plate must match, when set
    pub plate_pattern: Option<String>,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
}

impl NodeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("LPR_HOST").unwrap_or(defaults.host),
            port: non_empty("API_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            upload_dir: non_empty("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_base_url: non_empty("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            max_upload_bytes: non_empty("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            plate_model_path: non_empty("PLATE_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.plate_model_path),
            plate_confidence: non_empty("PLATE_CONFIDENCE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.plate_confidence),
            ocr_model_dir: non_empty("OCR_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.ocr_model_dir),
            font_path: non_empty("PLATE_FONT_PATH").map(PathBuf::from),
            debug_crop_path: non_empty("PLATE_DEBUG_CROP_PATH").map(PathBuf::from),
            plate_pattern: non_empty("PLATE_PATTERN"),
            ffmpeg_bin: non_empty("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: non_empty("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.plate_confidence) {
            return Err(format!(
                "PLATE_CONFIDENCE must be between 0 and 1, got {}",
                self.plate_confidence
            ));
        }
        if self.port == 0 {
            return Err("API_PORT must be greater than 0".to_string());
        }
        if self.max_upload_bytes == 0 {
            return Err("MAX_UPLOAD_BYTES must be greater than 0".to_string());
        }
        if let Some(pattern) = &self.plate_pattern {
            regex::Regex::new(pattern)
                .map_err(|e| format!("PLATE_PATTERN is not a valid regex: {}", e))?;
        }
        Ok(())
    }

    /// Socket address to bind the HTTP server to
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            public_base_url: "http://localhost:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            plate_model_path: PathBuf::from("./models/plate-yolo/best.onnx"),
            plate_confidence: 0.25,
            ocr_model_dir: PathBuf::from("./models/paddleocr-onnx"),
            font_path: None,
            debug_crop_path: None,
            plate_pattern: None,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
        }
    }
}
