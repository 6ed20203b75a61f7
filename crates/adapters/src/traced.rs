// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::destination::{DestinationAdapter, DestinationError};
use crate::notify::{NotifyAdapter, NotifyError};
use crate::source::{SourceAdapter, SourceError};
use async_trait::async_trait;
use bkp_core::{CallbackPayload, DestinationResult, RunContext, StagingError};
use std::path::PathBuf;
use tracing::Instrument;

/// Wrapper that adds tracing to any SourceAdapter
#[derive(Clone)]
pub struct TracedSourceAdapter<S> {
    inner: S,
    kind: &'static str,
}

impl<S> TracedSourceAdapter<S> {
    pub fn new(inner: S, kind: &'static str) -> Self {
        Self { inner, kind }
    }
}

#[async_trait]
impl<S: SourceAdapter> SourceAdapter for TracedSourceAdapter<S> {
    async fn fetch(&self, run: &RunContext) -> Result<Vec<PathBuf>, SourceError> {
        let span = tracing::info_span!(
            "source.fetch",
            name = %run.job_name,
            run_id = %run.run_id,
            kind = self.kind
        );

        async {
            tracing::info!(staging = %run.staging_dir.display(), "starting");

            let start = std::time::Instant::now();
            let result = self.inner.fetch(run).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(files) => tracing::info!(
                    files = files.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "fetched"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "fetch failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any DestinationAdapter
#[derive(Clone)]
pub struct TracedDestinationAdapter<D> {
    inner: D,
    kind: &'static str,
}

impl<D> TracedDestinationAdapter<D> {
    pub fn new(inner: D, kind: &'static str) -> Self {
        Self { inner, kind }
    }
}

#[async_trait]
impl<D: DestinationAdapter> DestinationAdapter for TracedDestinationAdapter<D> {
    async fn publish(
        &self,
        run: &RunContext,
        result: &mut DestinationResult,
    ) -> Result<(), DestinationError> {
        let span = tracing::info_span!(
            "destination.publish",
            name = %run.job_name,
            run_id = %run.run_id,
            kind = self.kind
        );

        async {
            tracing::info!("starting");

            // Precondition: the source step must have produced staging
            if !run.staging_dir.is_dir() {
                tracing::error!(staging = %run.staging_dir.display(), "staging directory does not exist");
                return Err(DestinationError::Staging(StagingError {
                    op: "read",
                    path: run.staging_dir.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "staging directory does not exist",
                    ),
                }));
            }

            let start = std::time::Instant::now();
            let outcome = self.inner.publish(run, result).await;
            let elapsed = start.elapsed();

            match &outcome {
                Ok(()) => tracing::info!(
                    files = result.files_uploaded,
                    bytes = result.bytes_uploaded,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "published"
                ),
                Err(e) => tracing::error!(
                    files = result.files_uploaded,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "publish failed"
                ),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any NotifyAdapter
#[derive(Clone)]
pub struct TracedNotifyAdapter<N> {
    inner: N,
}

impl<N> TracedNotifyAdapter<N> {
    pub fn new(inner: N) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<N: NotifyAdapter> NotifyAdapter for TracedNotifyAdapter<N> {
    async fn notify(&self, url: &str, payload: &CallbackPayload) -> Result<(), NotifyError> {
        let span = tracing::info_span!(
            "callback.notify",
            name = %payload.backup_name,
            run_id = %payload.backup_id
        );

        async {
            let start = std::time::Instant::now();
            let result = self.inner.notify(url, payload).await;
            let elapsed = start.elapsed();

            // failures never fail the run, so they are warnings here
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "callback sent"),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "callback failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
