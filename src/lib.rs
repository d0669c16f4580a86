// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod media;
pub mod pipeline;
pub mod version;
pub mod vision;

pub use config::NodeConfig;
pub use pipeline::{PipelineError, PlatePipeline, PlateRecord, PlateStatus, VideoPipeline, VideoReport};
pub use vision::{PlateBox, PlateLocator, TextEngine, TextLine, VisionModelManager};
