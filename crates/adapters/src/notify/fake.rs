// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake notification adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{NotifyAdapter, NotifyError};
use async_trait::async_trait;
use bkp_core::CallbackPayload;
use std::sync::{Arc, Mutex};

/// Recorded callback
#[derive(Debug, Clone)]
pub struct NotifyCall {
    pub url: String,
    pub payload: CallbackPayload,
}

/// Fake notification adapter for testing
#[derive(Clone, Default)]
pub struct FakeNotifyAdapter {
    calls: Arc<Mutex<Vec<NotifyCall>>>,
    failing_status: Arc<Mutex<Option<u16>>>,
}

impl FakeNotifyAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every callback with `status`
    pub fn fail_with(&self, status: u16) {
        *self.failing_status.lock().unwrap_or_else(|e| e.into_inner()) = Some(status);
    }

    /// Get all recorded notifications
    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl NotifyAdapter for FakeNotifyAdapter {
    async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NotifyCall {
                url: url.to_string(),
                payload: payload.clone(),
            });
        match *self.failing_status.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(status) => Err(NotifyError::Status(status)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
