// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run state shared by the pipeline steps

use crate::id::RunId;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Write-once description of a single job invocation
#[derive(Debug, Clone)]
pub struct RunContext {
    pub job_name: String,
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub timezone: Tz,
    pub staging_dir: PathBuf,
    /// strftime layout used in uploaded file names
    pub date_format: String,
}

impl RunContext {
    /// Start time rendered with the configured layout and zone.
    ///
    /// Falls back to the run id if the layout cannot be rendered.
    pub fn formatted_start(&self) -> String {
        let mut out = String::new();
        let local = self.started_at.with_timezone(&self.timezone);
        match write!(out, "{}", local.format(&self.date_format)) {
            Ok(()) => out,
            Err(_) => self.run_id.to_string(),
        }
    }

    /// Remote name for a staged file: `<stem>-<start><.ext>`. The extension
    /// starts at the last dot, so `.env` has an empty stem.
    pub fn remote_file_name(&self, local: &Path) -> String {
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, ext) = match name.rfind('.') {
            Some(dot) => name.split_at(dot),
            None => (name.as_str(), ""),
        };
        format!("{}-{}{}", stem, self.formatted_start(), ext)
    }
}

/// Upload totals of the most recent destination step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationResult {
    #[serde(rename = "totalUploadedFiles")]
    pub files_uploaded: u64,
    #[serde(rename = "totalUploadedSize")]
    pub bytes_uploaded: u64,
}

impl DestinationResult {
    pub fn record(&mut self, bytes: u64) {
        self.files_uploaded += 1;
        self.bytes_uploaded = self.bytes_uploaded.saturating_add(bytes);
    }
}

/// JSON body of the completion callback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// RFC 3339 start time in the configured zone
    pub backup_date: String,
    pub backup_ts: i64,
    pub backup_id: String,
    pub backup_name: String,
    pub backup_source: String,
    pub backup_destination: String,
    pub backup_destination_result: DestinationResult,
    /// Human-readable elapsed time, e.g. `"1m 3s 120ms"`
    pub backup_duration: String,
}

impl CallbackPayload {
    pub fn new(
        run: &RunContext,
        source: &str,
        destination: &str,
        result: DestinationResult,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let elapsed = (finished_at - run.started_at)
            .to_std()
            .unwrap_or_default();
        // millisecond precision keeps the string readable
        let elapsed = std::time::Duration::from_millis(elapsed.as_millis() as u64);
        Self {
            backup_date: run.started_at.with_timezone(&run.timezone).to_rfc3339(),
            backup_ts: run.started_at.timestamp(),
            backup_id: run.run_id.to_string(),
            backup_name: run.job_name.clone(),
            backup_source: source.to_string(),
            backup_destination: destination.to_string(),
            backup_destination_result: result,
            backup_duration: humantime::format_duration(elapsed).to_string(),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
