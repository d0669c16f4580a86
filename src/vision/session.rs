// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared ONNX Runtime session setup for the vision models

use anyhow::{anyhow, Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Thread count used by every vision session
const INTRA_THREADS: usize = 4;

/// An ONNX session serialised behind a mutex, plus its first input name
#[derive(Clone)]
pub struct SharedSession {
    session: Arc<Mutex<Session>>,
    input_name: String,
}

impl std::fmt::Debug for SharedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSession")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl SharedSession {
    /// Load a CPU-only session from an ONNX file
    ///
    /// `label` names the model in errors and logs.
    pub fn load(model_path: &Path, label: &str, default_input: &str) -> Result<Self> {
        if !model_path.exists() {
            anyhow::bail!("{} model not found: {}", label, model_path.display());
        }

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(INTRA_THREADS)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .with_context(|| {
                format!("Failed to load {} model from {}", label, model_path.display())
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| default_input.to_string());

        if let Some(input) = session.inputs.first() {
            debug!("{} model input {}: {:?}", label, input_name, input.input_type);
        }

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    /// Lock the session for one inference pass
    pub fn lock(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| anyhow!("ONNX session mutex poisoned"))
    }
}
