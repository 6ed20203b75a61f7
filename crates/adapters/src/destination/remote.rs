// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FTP and SFTP destinations

use super::{discard_local, DestinationAdapter, DestinationError};
use crate::transport::{Connector, RemoteFs};
use async_trait::async_trait;
use bkp_core::{
    list_files, remote_join, Clock, DestinationResult, RetentionPolicy, RunContext, SystemClock,
};
use std::path::PathBuf;

/// Uploads into a remote directory and applies the retention policy there
#[derive(Clone)]
pub struct RemoteDestination<C, K = SystemClock> {
    connector: C,
    target: String,
    retention: RetentionPolicy,
    delete_after_upload: bool,
    clock: K,
}

impl<C: Connector> RemoteDestination<C> {
    pub fn new(
        connector: C,
        target: &str,
        retention: RetentionPolicy,
        delete_after_upload: bool,
    ) -> Self {
        Self {
            connector,
            target: target.to_string(),
            retention,
            delete_after_upload,
            clock: SystemClock,
        }
    }
}

impl<C: Connector, K: Clock> RemoteDestination<C, K> {
    /// Use `clock` as "now" for age-based pruning
    pub fn with_clock<K2: Clock>(self, clock: K2) -> RemoteDestination<C, K2> {
        RemoteDestination {
            connector: self.connector,
            target: self.target,
            retention: self.retention,
            delete_after_upload: self.delete_after_upload,
            clock,
        }
    }
}

#[async_trait]
impl<C, K> DestinationAdapter for RemoteDestination<C, K>
where
    C: Connector,
    C::Session: RemoteFs,
    K: Clock,
{
    async fn publish(
        &self,
        run: &RunContext,
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError> {
        *result = DestinationResult::default();

        let uploads: Vec<(PathBuf, String)> = list_files(&run.staging_dir)
            .await?
            .into_iter()
            .map(|local| {
                let remote = remote_join(&self.target, &run.remote_file_name(&local));
                (local, remote)
            })
            .collect();

        let this = self.clone();
        let span = tracing::Span::current();
        let (partial, outcome) = tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                let mut partial = DestinationResult::default();
                let outcome = this.publish_blocking(&uploads, &mut partial);
                (partial, outcome)
            })
        })
        .await
        .map_err(|e| DestinationError::Aborted(e.to_string()))?;

        *result = partial;
        outcome
    }
}

impl<C, K> RemoteDestination<C, K>
where
    C: Connector,
    C::Session: RemoteFs,
    K: Clock,
{
    fn publish_blocking(
        &self,
        uploads: &[(PathBuf, String)],
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError> {
        let mut session = self.connector.connect()?;
        session.mkdir_all(&self.target);

        for (local, remote) in uploads {
            let bytes = session
                .upload(local, remote)
                .map_err(|source| DestinationError::Upload {
                    file: remote.clone(),
                    source,
                })?;
            result.record(bytes);
            tracing::info!(file = %remote, bytes, "uploaded");

            if self.delete_after_upload {
                discard_local(local);
            }
        }

        if !self.retention.is_empty() {
            let report = self
                .retention
                .apply(&mut session, &self.target, self.clock.now());
            tracing::debug!(deleted = report.deleted().len(), "retention applied");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
