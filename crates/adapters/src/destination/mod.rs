// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination adapters: push staged files out, then prune

mod remote;
mod telegram;

pub use remote::RemoteDestination;
pub use telegram::{SendError, TelegramDestination};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DestinationCall, FakeDestinationAdapter};

use crate::transport::{FtpConnector, SshConnector, TransportError};
use async_trait::async_trait;
use bkp_core::{DestinationConfig, DestinationKind, DestinationResult, RunContext, StagingError};
use thiserror::Error;

/// Errors from destination operations
#[derive(Debug, Error)]
pub enum DestinationError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("upload of {file} failed: {source}")]
    Upload {
        file: String,
        #[source]
        source: TransportError,
    },
    #[error("destination task aborted: {0}")]
    Aborted(String),
}

/// Adapter that publishes a run's staged files
#[async_trait]
pub trait DestinationAdapter: Clone + Send + Sync + 'static {
    /// Upload every file in `run.staging_dir`.
    ///
    /// `result` is reset first and then counts each successful upload, so it
    /// stays accurate when publishing stops part way.
    async fn publish(
        &self,
        run: &RunContext,
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError>;
}

/// Destination built from a job's `[destination]` table
#[derive(Clone)]
pub enum ConfiguredDestination {
    Ftp(RemoteDestination<FtpConnector>),
    Sftp(RemoteDestination<SshConnector>),
    Telegram(TelegramDestination),
}

impl ConfiguredDestination {
    pub fn from_config(config: &DestinationConfig, client: reqwest::Client) -> Self {
        let delete_after_upload = config.delete_after_upload();
        match &config.kind {
            DestinationKind::Ftp(ftp) => ConfiguredDestination::Ftp(RemoteDestination::new(
                FtpConnector::new(ftp.endpoint.clone()),
                &ftp.target,
                ftp.retention.clone(),
                delete_after_upload,
            )),
            DestinationKind::Sftp(sftp) => ConfiguredDestination::Sftp(RemoteDestination::new(
                SshConnector::new(sftp.endpoint.clone()),
                &sftp.target,
                sftp.retention.clone(),
                delete_after_upload,
            )),
            DestinationKind::Telegram(tg) => ConfiguredDestination::Telegram(
                TelegramDestination::new(client, tg, delete_after_upload),
            ),
        }
    }
}

#[async_trait]
impl DestinationAdapter for ConfiguredDestination {
    async fn publish(
        &self,
        run: &RunContext,
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError> {
        match self {
            ConfiguredDestination::Ftp(dest) => dest.publish(run, result).await,
            ConfiguredDestination::Sftp(dest) => dest.publish(run, result).await,
            ConfiguredDestination::Telegram(dest) => dest.publish(run, result).await,
        }
    }
}

/// Remove a staged file once it has been published
pub(crate) fn discard_local(path: &std::path::Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(file = %path.display(), "removed local copy"),
        Err(e) => tracing::warn!(file = %path.display(), error = %e, "failed to remove local copy"),
    }
}
