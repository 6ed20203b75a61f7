// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local staging directories, one per run under `<root>/<run_id>/`

use crate::id::RunId;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{op} {path}: {source}")]
pub struct StagingError {
    pub op: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl StagingError {
    fn new(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, run_id: RunId) -> PathBuf {
        self.root.join(run_id.to_string())
    }

    /// Create the run's directory with parents; existing directories are fine
    pub async fn create(&self, run_id: RunId) -> Result<PathBuf, StagingError> {
        let dir = self.dir_for(run_id);
        ensure_dir(&dir).await?;
        Ok(dir)
    }

    /// Remove the run's directory recursively. A missing directory is not an error.
    pub async fn remove(&self, run_id: RunId) -> Result<(), StagingError> {
        let dir = self.dir_for(run_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StagingError::new("remove", &dir, e)),
        }
    }

    /// Remove run directories left behind by earlier processes.
    ///
    /// Only entries whose name parses as a run id are touched.
    pub async fn sweep_stale(&self) -> Result<Vec<PathBuf>, StagingError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StagingError::new("read", &self.root, e)),
        };

        let mut removed = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StagingError::new("read", &self.root, e))?
        {
            let path = entry.path();
            let is_run_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.parse::<RunId>().is_ok());
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !(is_run_dir && is_dir) {
                continue;
            }
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => removed.push(path),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to sweep staging dir"),
            }
        }
        removed.sort();
        Ok(removed)
    }
}

/// Create `dir` and any missing parents
pub async fn ensure_dir(dir: &Path) -> Result<(), StagingError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StagingError::new("create", dir, e))
}

/// Regular files directly inside `dir`, sorted by name. Sub-directories are skipped.
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, StagingError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| StagingError::new("read", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| StagingError::new("read", dir, e))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| StagingError::new("stat", &entry.path(), e))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
#[path = "staging_tests.rs"]
mod tests;
