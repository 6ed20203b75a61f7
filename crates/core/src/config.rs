// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file
//!
//! ```toml
//! date_format = "%Y-%m-%d_%H-%M-%S"
//! timezone = "Europe/Istanbul"
//!
//! [[backups]]
//! name = "db"
//! cron = "0 3 * * *"
//!
//! [backups.source]
//! type = "sftp"
//! host = "db.internal"
//! user = "backup"
//! downloads = ["dump.sql.gz"]
//!
//! [backups.destination]
//! type = "ftp"
//! host = "storage.internal"
//! target = "/backups/db"
//! ```

use crate::job::{DestinationKind, Job, SourceConfig};
use crate::schedule::CronSpec;
use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[allow(clippy::expect_used)]
static SHELL_IDENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("constant regex pattern is valid")
});

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("backup {name:?}: {reason}")]
    Job { name: String, reason: String },
    #[error("invalid date format {0:?}")]
    DateFormat(String),
    #[error("unknown timezone {0:?}")]
    Timezone(String),
}

impl ConfigError {
    fn job(job: &Job, reason: impl Into<String>) -> Self {
        ConfigError::Job {
            name: job.name.clone(),
            reason: reason.into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// strftime layout applied to the run start time in uploaded file names
    #[serde(default = "default_date_format")]
    pub date_format: String,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// IANA zone for cron evaluation and file names; falls back to `TZ`, then UTC
    #[serde(default)]
    pub timezone: Option<String>,
    /// Parent of the per-run staging directories
    #[serde(default = "default_staging_root")]
    pub staging_root: PathBuf,
    #[serde(default)]
    pub backups: Vec<Job>,
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_staging_root() -> PathBuf {
    PathBuf::from("tmp")
}

impl Config {
    /// Read, parse and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_date_format(&self.date_format)?;
        if let Some(tz) = &self.timezone {
            tz.parse::<Tz>()
                .map_err(|_| ConfigError::Timezone(tz.clone()))?;
        }
        for job in &self.backups {
            validate_job(job)?;
        }
        Ok(())
    }

    /// Resolve the configured timezone
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        if let Some(tz) = &self.timezone {
            return tz
                .parse::<Tz>()
                .map_err(|_| ConfigError::Timezone(tz.clone()));
        }
        match std::env::var("TZ") {
            Ok(tz) if !tz.is_empty() => Ok(tz.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!(tz = %tz, "unknown TZ, using UTC");
                Tz::UTC
            })),
            _ => Ok(Tz::UTC),
        }
    }
}

fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    let invalid = format.is_empty()
        || format.contains('/')
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if invalid {
        return Err(ConfigError::DateFormat(format.to_string()));
    }
    Ok(())
}

fn validate_job(job: &Job) -> Result<(), ConfigError> {
    if job.name.trim().is_empty() {
        return Err(ConfigError::job(job, "name must not be empty"));
    }

    CronSpec::parse(&job.cron).map_err(|e| ConfigError::job(job, e.to_string()))?;

    if job.source.host().trim().is_empty() {
        return Err(ConfigError::job(job, "source host must not be empty"));
    }
    if job.source.downloads().is_empty() {
        return Err(ConfigError::job(job, "source downloads must not be empty"));
    }
    let mut staged = BTreeSet::new();
    for download in job.source.downloads() {
        if let Some(name) = Path::new(download).file_name() {
            if !staged.insert(name) {
                return Err(ConfigError::job(
                    job,
                    format!("download {:?} stages under a file name already in use", download),
                ));
            }
        }
    }
    if let SourceConfig::Sftp(sftp) = &job.source {
        if let Some(name) = sftp.variables.keys().find(|k| !SHELL_IDENT.is_match(k)) {
            return Err(ConfigError::job(
                job,
                format!("variable {:?} is not a valid shell identifier", name),
            ));
        }
    }

    if let Some(key) = job.source.unknown_keys().next() {
        return Err(ConfigError::job(job, format!("unknown source key {:?}", key)));
    }
    if let Some(key) = job.destination.unknown_keys().next() {
        return Err(ConfigError::job(job, format!("unknown destination key {:?}", key)));
    }

    match &job.destination.kind {
        DestinationKind::Ftp(ftp) => {
            require(job, &ftp.endpoint.host, "destination host")?;
            require(job, &ftp.target, "destination target")?;
        }
        DestinationKind::Sftp(sftp) => {
            require(job, &sftp.endpoint.host, "destination host")?;
            require(job, &sftp.target, "destination target")?;
        }
        DestinationKind::Telegram(tg) => {
            require(job, &tg.token, "telegram token")?;
            require(job, &tg.chat_id, "telegram chat_id")?;
        }
    }

    if let Some(retention) = job.destination.retention() {
        retention
            .validate()
            .map_err(|e| ConfigError::job(job, e.to_string()))?;
    }

    if let Some(url) = job.callback_url() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::job(job, format!("callback url {:?} is not http(s)", url)));
        }
    }

    Ok(())
}

fn require(job: &Job, value: &str, what: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::job(job, format!("{} must not be empty", what)));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
