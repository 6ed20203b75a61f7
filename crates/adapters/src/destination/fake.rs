// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake destination adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DestinationAdapter, DestinationError};
use async_trait::async_trait;
use bkp_core::{list_files, DestinationResult, RunContext, RunId};
use std::sync::{Arc, Mutex};

/// Recorded publish: the remote names the staged files would get
#[derive(Debug, Clone)]
pub struct DestinationCall {
    pub run_id: RunId,
    pub files: Vec<String>,
}

#[derive(Default)]
struct FakeDestinationState {
    error: Option<String>,
    calls: Vec<DestinationCall>,
}

/// Fake destination that accepts every staged file
#[derive(Clone, Default)]
pub struct FakeDestinationAdapter {
    state: Arc<Mutex<FakeDestinationState>>,
}

impl FakeDestinationAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish fail after counting nothing
    pub fn set_error(&self, message: &str) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).error = Some(message.to_string());
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<DestinationCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }
}

#[async_trait]
impl DestinationAdapter for FakeDestinationAdapter {
    async fn publish(
        &self,
        run: &RunContext,
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError> {
        *result = DestinationResult::default();
        let staged = list_files(&run.staging_dir).await?;

        let error = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.calls.push(DestinationCall {
                run_id: run.run_id,
                files: staged.iter().map(|p| run.remote_file_name(p)).collect(),
            });
            state.error.clone()
        };
        if let Some(message) = error {
            return Err(DestinationError::Aborted(message));
        }

        for path in staged {
            let bytes = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
            result.record(bytes);
        }
        Ok(())
    }
}
