// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bkp-core: domain model for the backup daemon
//!
//! This crate provides:
//! - Job and configuration model decoded from TOML
//! - Duration patterns and the retention (pruning) primitives
//! - Cron parsing, run identifiers, clocks and local staging

pub mod clock;
pub mod config;
pub mod duration;
pub mod id;
pub mod job;
pub mod retention;
pub mod run;
pub mod schedule;
pub mod staging;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError};
pub use duration::{resolve_pattern, Direction, DurationPattern};
pub use id::{IdGen, RunId, SequentialIdGen, TimestampIdGen};
pub use job::{DestinationConfig, DestinationKind, Job, SourceConfig};
pub use retention::{
    prune_by_count, prune_by_date, prune_by_size, remote_join, PruneError, RemoteEntry,
    RemoteListing, RetentionPolicy, RetentionReport,
};
pub use run::{CallbackPayload, DestinationResult, RunContext};
pub use schedule::{CronSpec, Granularity, ScheduleError};
pub use staging::{ensure_dir, list_files, StagingArea, StagingError};
