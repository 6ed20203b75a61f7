// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake source adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SourceAdapter, SourceError};
use async_trait::async_trait;
use bkp_core::{ensure_dir, RunContext, RunId};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Recorded fetch
#[derive(Debug, Clone)]
pub struct SourceCall {
    pub job_name: String,
    pub run_id: RunId,
    pub staging_dir: PathBuf,
}

#[derive(Default)]
struct FakeSourceState {
    files: Vec<(String, Vec<u8>)>,
    error: Option<String>,
    calls: Vec<SourceCall>,
}

/// Fake source that writes canned files into staging
#[derive(Clone, Default)]
pub struct FakeSourceAdapter {
    state: Arc<Mutex<FakeSourceState>>,
}

impl FakeSourceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `name` with `data` on every fetch
    pub fn with_file(self, name: &str, data: &[u8]) -> Self {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .files
            .push((name.to_string(), data.to_vec()));
        self
    }

    /// Make every fetch fail
    pub fn set_error(&self, message: &str) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).error = Some(message.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<SourceCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }
}

#[async_trait]
impl SourceAdapter for FakeSourceAdapter {
    async fn fetch(&self, run: &RunContext) -> Result<Vec<PathBuf>, SourceError> {
        let (files, error) = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.calls.push(SourceCall {
                job_name: run.job_name.clone(),
                run_id: run.run_id,
                staging_dir: run.staging_dir.clone(),
            });
            (state.files.clone(), state.error.clone())
        };

        if let Some(message) = error {
            return Err(SourceError::Aborted(message));
        }

        ensure_dir(&run.staging_dir).await?;
        let mut staged = Vec::with_capacity(files.len());
        for (name, data) in files {
            let path = run.staging_dir.join(name);
            tokio::fs::write(&path, data)
                .await
                .map_err(|e| SourceError::Aborted(e.to_string()))?;
            staged.push(path);
        }
        if staged.is_empty() {
            return Err(SourceError::NothingFetched(0));
        }
        Ok(staged)
    }
}
