// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bkp_adapters::transport::CONNECT_TIMEOUT;
use bkp_core::{Config, ConfigError, StagingArea, StagingError, SystemClock, TimestampIdGen};
use bkp_engine::{drain, ConfiguredAdapters, JobHandle, JobRunner, RunSettings, Scheduler};
use fs2::FileExt;
use thiserror::Error;
use tracing::{error, info, warn};

/// Lock file kept in the staging root while the daemon runs
pub const LOCK_FILE_NAME: &str = "backupperd.pid";

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to acquire lock {0}: daemon already running?")]
    LockFailed(PathBuf, #[source] std::io::Error),

    #[error("staging error: {0}")]
    Staging(#[from] StagingError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Running daemon
pub struct Daemon {
    scheduler: Scheduler,
    lock_path: PathBuf,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

impl Daemon {
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Registered jobs in configuration order
    pub fn jobs(&self) -> Vec<JobHandle> {
        self.scheduler.jobs()
    }

    /// Stop scheduling, wait for every in-flight run, then release the lock
    pub async fn shutdown(self) {
        info!("Shutting down daemon...");
        self.scheduler.stop();
        drain(self.scheduler.activity()).await;

        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            warn!("Failed to remove lock file: {}", e);
        }
        info!("Daemon shutdown complete");
    }
}

/// Start the daemon: lock, sweep stale staging, register every job
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let timezone = config.timezone()?;

    // 1. Staging root holds the lock, so it must exist first
    std::fs::create_dir_all(&config.staging_root)?;
    let lock_path = config.staging_root.join(LOCK_FILE_NAME);
    let lock_file = acquire_lock(&lock_path)?;

    // 2. Runs from a previous process can never finish now
    let staging = StagingArea::new(&config.staging_root);
    let swept = staging.sweep_stale().await?;
    if !swept.is_empty() {
        info!(count = swept.len(), "removed stale staging directories");
    }

    // 3. Register jobs; a failed registration only skips that job
    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    let adapters = ConfiguredAdapters::new(client);
    let settings = RunSettings {
        staging,
        timezone,
        date_format: config.date_format.clone(),
    };
    let ids = TimestampIdGen::new();
    let scheduler = Scheduler::new(timezone);

    for job in &config.backups {
        let runner = Arc::new(JobRunner::new(
            job.clone(),
            settings.clone(),
            &adapters,
            SystemClock,
            ids.clone(),
        ));
        let registered = scheduler.register(&job.name, &job.cron, move || {
            let runner = Arc::clone(&runner);
            async move {
                runner.run().await;
            }
        });
        if let Err(e) = registered {
            error!(name = %job.name, error = %e, "failed to schedule backup");
        }
    }

    log_banner(&scheduler);

    Ok(Daemon {
        scheduler,
        lock_path,
        lock_file,
    })
}

fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    // Open without truncating so a running daemon's pid survives a failed attempt
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.try_lock_exclusive()
        .map_err(|e| LifecycleError::LockFailed(path.to_path_buf(), e))?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

fn log_banner(scheduler: &Scheduler) {
    let jobs = scheduler.jobs();
    info!("Backupper v{}", env!("CARGO_PKG_VERSION"));
    info!(timezone = %scheduler.timezone(), "{} backup(s) scheduled", jobs.len());
    for job in &jobs {
        let next_run = job
            .next_run()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        info!(name = job.name(), next_run = %next_run, cron = %job.cron(), "backup scheduled");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
