// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retention policy and the pruning primitives shared by every transport.
//!
//! The primitives work against any [`RemoteListing`], so FTP and SFTP
//! destinations get the same contract: sub-directories are never touched,
//! entries are considered oldest first, and a failed delete is skipped
//! rather than aborting the prune.

use crate::duration::{Direction, DurationPattern};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub is_dir: bool,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>, size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            modified,
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>, modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            modified,
            is_dir: true,
        }
    }
}

/// A remote directory tree that can be listed and pruned
pub trait RemoteListing {
    type Error: fmt::Display;

    /// List the direct children of `dir`
    fn list(&mut self, dir: &str) -> Result<Vec<RemoteEntry>, Self::Error>;

    /// Delete the file at `path`
    fn delete(&mut self, path: &str) -> Result<(), Self::Error>;
}

/// Errors from pruning a remote directory
#[derive(Debug, Error)]
pub enum PruneError {
    #[error("failed to list {dir}: {message}")]
    Listing { dir: String, message: String },
    #[error("invalid duration pattern: {0:?}")]
    InvalidPattern(String),
}

/// Post-upload retention thresholds. Every configured threshold applies,
/// count first, then size, then age.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPolicy {
    /// Keep at most this many files (newest win). Zero disables.
    #[serde(default)]
    pub max_count: Option<usize>,
    /// Keep the directory's total size at or below this many bytes. Zero disables.
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// Delete files older than this duration pattern, e.g. `"30 DAYS"`
    #[serde(default)]
    pub older_than: Option<String>,
}

impl RetentionPolicy {
    pub fn is_empty(&self) -> bool {
        self.count_limit().is_none() && self.size_limit().is_none() && self.older_than.is_none()
    }

    pub fn count_limit(&self) -> Option<usize> {
        self.max_count.filter(|n| *n > 0)
    }

    pub fn size_limit(&self) -> Option<u64> {
        self.max_bytes.filter(|n| *n > 0)
    }

    /// Check that the age threshold is a parseable pattern
    pub fn validate(&self) -> Result<(), PruneError> {
        if let Some(pattern) = &self.older_than {
            if DurationPattern::parse(pattern).is_none() {
                return Err(PruneError::InvalidPattern(pattern.clone()));
            }
        }
        Ok(())
    }

    /// Apply every configured threshold to `dir`.
    ///
    /// Failures are logged and recorded in the report; they never stop the
    /// remaining thresholds from running.
    pub fn apply<L: RemoteListing>(
        &self,
        remote: &mut L,
        dir: &str,
        now: DateTime<Utc>,
    ) -> RetentionReport {
        let mut report = RetentionReport::default();

        if let Some(limit) = self.count_limit() {
            let result = prune_by_count(remote, dir, limit);
            log_outcome("count", &limit.to_string(), &result);
            report.by_count = Some(result);
        }

        if let Some(limit) = self.size_limit() {
            let result = prune_by_size(remote, dir, limit);
            log_outcome("size", &limit.to_string(), &result);
            report.by_size = Some(result);
        }

        if let Some(pattern) = &self.older_than {
            let result = prune_by_date(remote, dir, pattern, now);
            log_outcome("date", pattern, &result);
            report.by_date = Some(result);
        }

        report
    }
}

/// Outcome of [`RetentionPolicy::apply`], one slot per threshold
#[derive(Debug, Default)]
pub struct RetentionReport {
    pub by_count: Option<Result<Vec<String>, PruneError>>,
    pub by_size: Option<Result<Vec<String>, PruneError>>,
    pub by_date: Option<Result<Vec<String>, PruneError>>,
}

impl RetentionReport {
    /// All names deleted by successful thresholds
    pub fn deleted(&self) -> Vec<String> {
        [&self.by_count, &self.by_size, &self.by_date]
            .into_iter()
            .flatten()
            .filter_map(|r| r.as_ref().ok())
            .flatten()
            .cloned()
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        [&self.by_count, &self.by_size, &self.by_date]
            .into_iter()
            .flatten()
            .any(|r| r.is_err())
    }
}

fn log_outcome(kind: &str, limit: &str, result: &Result<Vec<String>, PruneError>) {
    match result {
        Ok(deleted) => tracing::info!(kind, limit, deleted = ?deleted, "retention applied"),
        Err(e) => tracing::error!(kind, limit, error = %e, "retention failed"),
    }
}

/// Keep the newest `limit` files and delete the rest
pub fn prune_by_count<L: RemoteListing>(
    remote: &mut L,
    dir: &str,
    limit: usize,
) -> Result<Vec<String>, PruneError> {
    let files = sorted_files(remote, dir)?;
    let excess = files.len().saturating_sub(limit);
    Ok(delete_all(remote, dir, files.iter().take(excess)))
}

/// Delete the oldest files until the directory's total size is at most `limit`.
///
/// A file whose delete fails is still counted as removed.
pub fn prune_by_size<L: RemoteListing>(
    remote: &mut L,
    dir: &str,
    limit: u64,
) -> Result<Vec<String>, PruneError> {
    let files = sorted_files(remote, dir)?;
    let total: i128 = files.iter().map(|f| i128::from(f.size)).sum();
    let mut excess = total - i128::from(limit);

    let mut victims = Vec::new();
    for file in &files {
        if excess <= 0 {
            break;
        }
        excess -= i128::from(file.size);
        victims.push(file);
    }
    Ok(delete_all(remote, dir, victims.into_iter()))
}

/// Delete every file modified strictly before `now - pattern`
pub fn prune_by_date<L: RemoteListing>(
    remote: &mut L,
    dir: &str,
    pattern: &str,
    now: DateTime<Utc>,
) -> Result<Vec<String>, PruneError> {
    let cutoff = DurationPattern::parse(pattern)
        .and_then(|p| p.resolve(now, Direction::Before))
        .ok_or_else(|| PruneError::InvalidPattern(pattern.to_string()))?;

    let files = sorted_files(remote, dir)?;
    Ok(delete_all(
        remote,
        dir,
        files.iter().filter(|f| f.modified < cutoff),
    ))
}

/// Join a remote directory and a child name with `/`
pub fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn sorted_files<L: RemoteListing>(remote: &mut L, dir: &str) -> Result<Vec<RemoteEntry>, PruneError> {
    let mut files: Vec<RemoteEntry> = remote
        .list(dir)
        .map_err(|e| PruneError::Listing {
            dir: dir.to_string(),
            message: e.to_string(),
        })?
        .into_iter()
        .filter(|e| !e.is_dir)
        .collect();
    files.sort_by_key(|f| f.modified);
    Ok(files)
}

fn delete_all<'a, L: RemoteListing>(
    remote: &mut L,
    dir: &str,
    victims: impl Iterator<Item = &'a RemoteEntry>,
) -> Vec<String> {
    let mut deleted = Vec::new();
    for entry in victims {
        let path = remote_join(dir, &entry.name);
        match remote.delete(&path) {
            Ok(()) => deleted.push(entry.name.clone()),
            Err(e) => tracing::warn!(path = %path, error = %e, "delete failed, skipping"),
        }
    }
    deleted
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
