// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backup daemon (backupperd)
//!
//! Loads the backup configuration, runs every job on its cron schedule and
//! drains in-flight runs before exiting on a termination signal.

use std::path::PathBuf;

use bkp_core::Config;
use bkp_daemon::{lifecycle, LifecycleError};
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "backupperd", version, about = "Scheduled FTP/SFTP/Telegram backups")]
struct Args {
    /// Path to the configuration file
    #[arg(long, short, default_value = "backupper.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration before logging; its log settings drive the subscriber
    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("backupperd: {}", e);
            return Err(LifecycleError::from(e).into());
        }
    };

    let log_guard = setup_logging(&config)?;

    info!("Starting backupperd with {}", args.config.display());

    let daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            // Write to stderr synchronously; the file appender may not flush in time
            eprintln!("backupperd: {}", e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    // Signal ready for a supervising parent process
    println!("READY");

    let received = tokio::select! {
        _ = sighup.recv() => "SIGHUP",
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    info!("Received {}, shutting down...", received);
    daemon.shutdown().await;

    info!("Daemon stopped");
    drop(log_guard);
    Ok(())
}

/// Log to stdout and to `<log_dir>/backupperd.log`.
///
/// Level comes from `RUST_LOG`, else the configured `log_level`, else `info`.
fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.log_dir).map_err(LifecycleError::from)?;

    let file_appender = tracing_appender::rolling::never(&config.log_dir, "backupperd.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let level = config.log_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .try_init()?;

    Ok(guard)
}
