// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup job definitions
//!
//! A job pairs one source with one destination and a cron schedule. Sources
//! and destinations are closed tagged enums decoded from the `type` key of
//! their configuration table. Those tables are flattened, so keys no field
//! claims are collected in `extra` and rejected by config validation.

use crate::retention::RetentionPolicy;
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default remote scratch root for SFTP sources
pub const DEFAULT_SCRATCH_ROOT: &str = "/tmp/backupper";

/// Default Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// One configured backup
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    pub name: String,
    /// 5-field (minute) or 6-field (second) cron expression
    pub cron: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Remove the staging directory after the run. Defaults to true.
    #[serde(default)]
    pub delete_local: Option<bool>,
}

impl Job {
    pub fn delete_local(&self) -> bool {
        self.delete_local.unwrap_or(true)
    }

    /// Callback URL, treating an empty string as unset
    pub fn callback_url(&self) -> Option<&str> {
        self.callback_url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

/// FTP connection parameters
#[derive(Debug, Clone, Deserialize)]
pub struct FtpEndpoint {
    pub host: String,
    #[serde(default = "default_ftp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub pass: String,
}

/// SSH/SFTP connection parameters. A private key takes precedence over the
/// password when both are configured.
#[derive(Debug, Clone, Deserialize)]
pub struct SshEndpoint {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,
    #[serde(default)]
    pub passphrase: Option<String>,
}

fn default_ftp_port() -> u16 {
    21
}

fn default_ssh_port() -> u16 {
    22
}

/// Where files come from
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Ftp(FtpSourceConfig),
    Sftp(SftpSourceConfig),
}

impl SourceConfig {
    /// Type tag as written in configuration
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Ftp(_) => "ftp",
            SourceConfig::Sftp(_) => "sftp",
        }
    }

    pub fn host(&self) -> &str {
        match self {
            SourceConfig::Ftp(c) => &c.endpoint.host,
            SourceConfig::Sftp(c) => &c.endpoint.host,
        }
    }

    pub fn downloads(&self) -> &[String] {
        match self {
            SourceConfig::Ftp(c) => &c.downloads,
            SourceConfig::Sftp(c) => &c.downloads,
        }
    }

    /// Keys in the source table that match no setting
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        let extra = match self {
            SourceConfig::Ftp(c) => &c.extra,
            SourceConfig::Sftp(c) => &c.extra,
        };
        extra.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FtpSourceConfig {
    #[serde(flatten)]
    pub endpoint: FtpEndpoint,
    /// Remote paths to retrieve
    pub downloads: Vec<String>,
    /// Keys no field claimed, rejected at validation
    #[serde(flatten)]
    pub extra: BTreeMap<String, IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SftpSourceConfig {
    #[serde(flatten)]
    pub endpoint: SshEndpoint,
    /// Exported to `before_commands` as shell variables
    #[serde(default)]
    pub variables: BTreeMap<String, VariableValue>,
    #[serde(default)]
    pub before_commands: Vec<String>,
    /// Relative paths resolve inside the run's scratch directory
    pub downloads: Vec<String>,
    #[serde(default)]
    pub after_commands: Vec<String>,
    #[serde(default)]
    pub scratch_root: Option<String>,
    /// Keys no field claimed, rejected at validation
    #[serde(flatten)]
    pub extra: BTreeMap<String, IgnoredAny>,
}

impl SftpSourceConfig {
    pub fn scratch_root(&self) -> &str {
        self.scratch_root.as_deref().unwrap_or(DEFAULT_SCRATCH_ROOT)
    }
}

/// A user-declared variable. Only scalars are exported; anything else
/// (arrays, tables, datetimes) is accepted and skipped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Unsupported(IgnoredAny),
}

impl VariableValue {
    /// Render as the right-hand side of a shell assignment
    pub fn to_shell(&self) -> Option<String> {
        match self {
            VariableValue::Bool(b) => Some(b.to_string()),
            VariableValue::Int(i) => Some(i.to_string()),
            VariableValue::Float(f) => Some(f.to_string()),
            VariableValue::Str(s) => Some(shell_quote(s)),
            VariableValue::Unsupported(_) => None,
        }
    }
}

/// Quote `value` for a POSIX shell using single quotes
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Where files go
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    #[serde(flatten)]
    pub kind: DestinationKind,
    /// Remove each staged file locally once it has been uploaded
    #[serde(default)]
    pub delete_after_upload: Option<bool>,
}

impl DestinationConfig {
    pub fn delete_after_upload(&self) -> bool {
        self.delete_after_upload.unwrap_or(false)
    }

    /// Type tag as written in configuration
    pub fn kind(&self) -> &'static str {
        match &self.kind {
            DestinationKind::Ftp(_) => "ftp",
            DestinationKind::Sftp(_) => "sftp",
            DestinationKind::Telegram(_) => "telegram",
        }
    }

    pub fn retention(&self) -> Option<&RetentionPolicy> {
        match &self.kind {
            DestinationKind::Ftp(c) => Some(&c.retention),
            DestinationKind::Sftp(c) => Some(&c.retention),
            DestinationKind::Telegram(_) => None,
        }
    }

    /// Keys in the destination table that match no setting
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        let extra = match &self.kind {
            DestinationKind::Ftp(c) => &c.extra,
            DestinationKind::Sftp(c) => &c.extra,
            DestinationKind::Telegram(c) => &c.extra,
        };
        extra.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DestinationKind {
    Ftp(FtpDestinationConfig),
    Sftp(SftpDestinationConfig),
    Telegram(TelegramDestinationConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FtpDestinationConfig {
    #[serde(flatten)]
    pub endpoint: FtpEndpoint,
    /// Remote directory, created if missing
    pub target: String,
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Keys no field claimed, rejected at validation
    #[serde(flatten)]
    pub extra: BTreeMap<String, IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SftpDestinationConfig {
    #[serde(flatten)]
    pub endpoint: SshEndpoint,
    pub target: String,
    #[serde(default)]
    pub retention: RetentionPolicy,
    /// Keys no field claimed, rejected at validation
    #[serde(flatten)]
    pub extra: BTreeMap<String, IgnoredAny>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramDestinationConfig {
    pub token: String,
    pub chat_id: String,
    #[serde(default)]
    pub api_base: Option<String>,
    /// Keys no field claimed, rejected at validation
    #[serde(flatten)]
    pub extra: BTreeMap<String, IgnoredAny>,
}

impl TelegramDestinationConfig {
    pub fn api_base(&self) -> &str {
        self.api_base
            .as_deref()
            .unwrap_or(DEFAULT_TELEGRAM_API)
            .trim_end_matches('/')
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
