// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Backup execution engine: job pipeline, cron scheduler and shutdown drain

mod adapters;
mod drain;
mod pipeline;
mod scheduler;

pub use adapters::{ConfiguredAdapters, JobAdapters};
pub use drain::{drain, drain_every, RunActivity, RunGuard, DRAIN_POLL_INTERVAL};
pub use pipeline::{JobRunner, RunPhase, RunReport, RunSettings, StepOutcome};
pub use scheduler::{JobHandle, Scheduler};
