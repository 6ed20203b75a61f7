// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source adapters: fetch remote files into a run's staging directory

mod remote;

pub use remote::{after_script, before_script, FtpSource, SftpSource};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSourceAdapter, SourceCall};

use crate::transport::{FtpConnector, SshConnector, TransportError};
use async_trait::async_trait;
use bkp_core::{RunContext, SourceConfig, StagingError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from source operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Staging(#[from] StagingError),
    #[error("before_commands failed: {0}")]
    BeforeCommands(#[source] TransportError),
    #[error("after_commands failed: {0}")]
    AfterCommands(#[source] TransportError),
    #[error("all {0} downloads failed")]
    NothingFetched(usize),
    #[error("source task aborted: {0}")]
    Aborted(String),
}

/// Adapter that stages a job's files locally
#[async_trait]
pub trait SourceAdapter: Clone + Send + Sync + 'static {
    /// Retrieve the configured files into `run.staging_dir`.
    ///
    /// Returns the staged paths. Individual missing files are skipped; the
    /// call only fails when nothing could be retrieved.
    async fn fetch(&self, run: &RunContext) -> Result<Vec<PathBuf>, SourceError>;
}

/// Source built from a job's `[source]` table
#[derive(Clone)]
pub enum ConfiguredSource {
    Ftp(FtpSource<FtpConnector>),
    Sftp(SftpSource<SshConnector>),
}

impl ConfiguredSource {
    pub fn from_config(config: &SourceConfig) -> Self {
        match config {
            SourceConfig::Ftp(ftp) => ConfiguredSource::Ftp(FtpSource::new(
                FtpConnector::new(ftp.endpoint.clone()),
                ftp.downloads.clone(),
            )),
            SourceConfig::Sftp(sftp) => ConfiguredSource::Sftp(SftpSource::new(
                SshConnector::new(sftp.endpoint.clone()),
                sftp.clone(),
            )),
        }
    }
}

#[async_trait]
impl SourceAdapter for ConfiguredSource {
    async fn fetch(&self, run: &RunContext) -> Result<Vec<PathBuf>, SourceError> {
        match self {
            ConfiguredSource::Ftp(source) => source.fetch(run).await,
            ConfiguredSource::Sftp(source) => source.fetch(run).await,
        }
    }
}
