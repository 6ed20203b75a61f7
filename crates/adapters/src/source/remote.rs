// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FTP and SFTP sources

use super::{SourceAdapter, SourceError};
use crate::transport::{Connector, RemoteFs, RemoteShell};
use async_trait::async_trait;
use bkp_core::job::{shell_quote, SftpSourceConfig, VariableValue};
use bkp_core::{ensure_dir, remote_join, RunContext, RunId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Plain FTP source: every download path is used as given
#[derive(Clone)]
pub struct FtpSource<C> {
    connector: C,
    downloads: Vec<String>,
}

impl<C: Connector> FtpSource<C> {
    pub fn new(connector: C, downloads: Vec<String>) -> Self {
        Self {
            connector,
            downloads,
        }
    }
}

#[async_trait]
impl<C> SourceAdapter for FtpSource<C>
where
    C: Connector,
    C::Session: RemoteFs,
{
    async fn fetch(&self, run: &RunContext) -> Result<Vec<PathBuf>, SourceError> {
        ensure_dir(&run.staging_dir).await?;

        let connector = self.connector.clone();
        let plan: Vec<(String, PathBuf)> = self
            .downloads
            .iter()
            .filter_map(|d| staged_path(&run.staging_dir, d).map(|local| (d.clone(), local)))
            .collect();
        let requested = self.downloads.len();
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| {
                let mut session = connector.connect()?;
                download_all(&mut session, &plan, requested)
            })
        })
        .await
        .map_err(|e| SourceError::Aborted(e.to_string()))?
    }
}

/// SFTP source with optional shell commands around the downloads
#[derive(Clone)]
pub struct SftpSource<C> {
    connector: C,
    config: SftpSourceConfig,
}

impl<C: Connector> SftpSource<C> {
    pub fn new(connector: C, config: SftpSourceConfig) -> Self {
        Self { connector, config }
    }
}

#[async_trait]
impl<C> SourceAdapter for SftpSource<C>
where
    C: Connector,
    C::Session: RemoteFs + RemoteShell,
{
    async fn fetch(&self, run: &RunContext) -> Result<Vec<PathBuf>, SourceError> {
        ensure_dir(&run.staging_dir).await?;

        let connector = self.connector.clone();
        let config = self.config.clone();
        let job_name = run.job_name.clone();
        let run_id = run.run_id;
        let staging_dir = run.staging_dir.clone();
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| fetch_sftp(&connector, &config, &job_name, run_id, &staging_dir))
        })
        .await
        .map_err(|e| SourceError::Aborted(e.to_string()))?
    }
}

fn fetch_sftp<C>(
    connector: &C,
    config: &SftpSourceConfig,
    job_name: &str,
    run_id: RunId,
    staging_dir: &Path,
) -> Result<Vec<PathBuf>, SourceError>
where
    C: Connector,
    C::Session: RemoteFs + RemoteShell,
{
    let mut session = connector.connect()?;
    let scratch_root = config.scratch_root();

    if !config.before_commands.is_empty() {
        let script = before_script(
            job_name,
            run_id,
            scratch_root,
            &config.variables,
            &config.before_commands,
        );
        let output = session
            .run_script(&script)
            .map_err(SourceError::BeforeCommands)?;
        tracing::debug!(output = %output, "before_commands finished");
    }

    let scratch_dir = remote_join(scratch_root, &run_id.to_string());
    let plan: Vec<(String, PathBuf)> = config
        .downloads
        .iter()
        .filter_map(|download| {
            let remote = if download.starts_with('/') {
                download.clone()
            } else {
                remote_join(&scratch_dir, download)
            };
            staged_path(staging_dir, download).map(|local| (remote, local))
        })
        .collect();
    let staged = download_all(&mut session, &plan, config.downloads.len())?;

    if !config.after_commands.is_empty() {
        let script = after_script(job_name, run_id, &config.after_commands);
        let output = session
            .run_script(&script)
            .map_err(SourceError::AfterCommands)?;
        tracing::debug!(output = %output, "after_commands finished");
    }

    Ok(staged)
}

/// Staging destination for a download: the staging dir plus the path's file name
fn staged_path(staging_dir: &Path, download: &str) -> Option<PathBuf> {
    match Path::new(download).file_name() {
        Some(name) => Some(staging_dir.join(name)),
        None => {
            tracing::warn!(file = download, "download path has no file name, skipping");
            None
        }
    }
}

fn download_all<S: RemoteFs>(
    session: &mut S,
    plan: &[(String, PathBuf)],
    requested: usize,
) -> Result<Vec<PathBuf>, SourceError> {
    let mut staged = Vec::with_capacity(plan.len());
    let mut claimed = BTreeSet::new();
    for (remote, local) in plan {
        // First download listed owns its staged file name
        if !claimed.insert(local) {
            tracing::error!(
                file = %remote,
                local = %local.display(),
                "download shares a staged file name with an earlier one, skipping"
            );
            continue;
        }
        match session.download(remote, local) {
            Ok(bytes) => {
                tracing::debug!(file = %remote, bytes, "downloaded");
                staged.push(local.clone());
            }
            Err(e) => tracing::error!(file = %remote, error = %e, "download failed"),
        }
    }

    if staged.is_empty() {
        return Err(SourceError::NothingFetched(requested));
    }
    Ok(staged)
}

fn script_header(job_name: &str, run_id: RunId) -> Vec<String> {
    vec![
        format!("export BACKUP_ID={}", run_id),
        format!("export BACKUP_NAME={}", shell_quote(job_name)),
    ]
}

/// Script run before the downloads.
///
/// Exports the run identity, creates the remote scratch directory (exported
/// as `BACKUP_DIR`), exports the user variables, then runs the commands.
pub fn before_script(
    job_name: &str,
    run_id: RunId,
    scratch_root: &str,
    variables: &BTreeMap<String, VariableValue>,
    commands: &[String],
) -> String {
    let mut lines = script_header(job_name, run_id);
    lines.push(format!(
        "export BACKUP_DIR={}/\"$BACKUP_ID\"",
        shell_quote(scratch_root.trim_end_matches('/'))
    ));
    lines.push("mkdir -p \"$BACKUP_DIR\"".to_string());
    for (name, value) in variables {
        match value.to_shell() {
            Some(rendered) => lines.push(format!("export {}={}", name, rendered)),
            None => tracing::debug!(variable = %name, "skipping non-scalar variable"),
        }
    }
    lines.extend(commands.iter().cloned());
    lines.push(String::new());
    lines.join("\n")
}

/// Script run after the downloads
pub fn after_script(job_name: &str, run_id: RunId, commands: &[String]) -> String {
    let mut lines = script_header(job_name, run_id);
    lines.extend(commands.iter().cloned());
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
