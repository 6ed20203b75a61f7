// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telegram Bot API document upload

use super::{discard_local, DestinationAdapter, DestinationError};
use async_trait::async_trait;
use bkp_core::job::TelegramDestinationConfig;
use bkp_core::{list_files, DestinationResult, RunContext};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use thiserror::Error;

/// Per-file upload failure. Logged, never fatal to the publish.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("telegram returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Sends each staged file to a chat as a document
#[derive(Clone)]
pub struct TelegramDestination {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
    delete_after_upload: bool,
}

impl TelegramDestination {
    pub fn new(
        client: reqwest::Client,
        config: &TelegramDestinationConfig,
        delete_after_upload: bool,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}/sendDocument", config.api_base(), config.token),
            chat_id: config.chat_id.clone(),
            delete_after_upload,
        }
    }

    /// Upload one file, returning its size
    pub async fn send(&self, path: &Path) -> Result<u64, SendError> {
        let data = tokio::fs::read(path).await.map_err(|source| SendError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let size = data.len() as u64;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .part("document", Part::bytes(data).file_name(file_name));

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(SendError::Status { status, body });
        }
        Ok(size)
    }
}

#[async_trait]
impl DestinationAdapter for TelegramDestination {
    async fn publish(
        &self,
        run: &RunContext,
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError> {
        *result = DestinationResult::default();

        for path in list_files(&run.staging_dir).await? {
            let file = path.display().to_string();
            match self.send(&path).await {
                Ok(bytes) => {
                    result.record(bytes);
                    tracing::info!(file = %file, bytes, "sent to telegram");
                    if self.delete_after_upload {
                        discard_local(&path);
                    }
                }
                Err(e) => tracing::error!(file = %file, error = %e, "telegram upload failed"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "telegram_tests.rs"]
mod tests;
