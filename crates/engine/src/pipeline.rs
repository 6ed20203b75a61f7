// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job execution pipeline
//!
//! One invocation walks `SourceRunning -> DestinationRunning ->
//! CallbackRunning -> CleanupRunning` and always ends back in `Idle`. Only a
//! source failure short-circuits; every later failure is logged and the
//! remaining steps still run.

use crate::adapters::JobAdapters;
use bkp_adapters::{DestinationAdapter, NotifyAdapter, SourceAdapter};
use bkp_core::{
    CallbackPayload, Clock, DestinationResult, IdGen, Job, RunContext, RunId, StagingArea,
};
use chrono_tz::Tz;
use std::fmt;
use tracing::Instrument;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    SourceRunning,
    SourceFailed,
    DestinationRunning,
    CallbackRunning,
    CleanupRunning,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::SourceRunning => "source",
            RunPhase::SourceFailed => "source_failed",
            RunPhase::DestinationRunning => "destination",
            RunPhase::CallbackRunning => "callback",
            RunPhase::CleanupRunning => "cleanup",
        };
        f.write_str(name)
    }
}

/// Outcome of an optional step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Skipped,
    Done,
    Failed(String),
}

/// Everything observable about one finished invocation
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    /// Phases entered, in order
    pub phases: Vec<RunPhase>,
    pub source_error: Option<String>,
    pub destination_error: Option<String>,
    pub result: DestinationResult,
    pub callback: StepOutcome,
    pub cleanup: StepOutcome,
}

impl RunReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            phases: Vec::new(),
            source_error: None,
            destination_error: None,
            result: DestinationResult::default(),
            callback: StepOutcome::Skipped,
            cleanup: StepOutcome::Skipped,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        tracing::trace!(%phase, "entering phase");
        self.phases.push(phase);
    }

    /// Whether the run reached the destination and it succeeded
    pub fn succeeded(&self) -> bool {
        self.source_error.is_none() && self.destination_error.is_none()
    }
}

/// Process-wide settings every run shares
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub staging: StagingArea,
    pub timezone: Tz,
    pub date_format: String,
}

/// Runs one configured job
pub struct JobRunner<A: JobAdapters, K: Clock, G: IdGen> {
    job: Job,
    settings: RunSettings,
    source: A::Source,
    destination: A::Destination,
    notify: A::Notify,
    clock: K,
    ids: G,
}

impl<A, K, G> JobRunner<A, K, G>
where
    A: JobAdapters,
    K: Clock,
    G: IdGen,
{
    pub fn new(job: Job, settings: RunSettings, adapters: &A, clock: K, ids: G) -> Self {
        Self {
            source: adapters.source(&job),
            destination: adapters.destination(&job),
            notify: adapters.notify(),
            job,
            settings,
            clock,
            ids,
        }
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Execute one invocation end to end
    pub async fn run(&self) -> RunReport {
        let started_at = self.clock.now();
        let run_id = self.ids.next(started_at);
        let run = RunContext {
            job_name: self.job.name.clone(),
            run_id,
            started_at,
            timezone: self.settings.timezone,
            staging_dir: self.settings.staging.dir_for(run_id),
            date_format: self.settings.date_format.clone(),
        };

        let span = tracing::info_span!("job.run", name = %self.job.name, run_id = %run_id);
        self.execute(run).instrument(span).await
    }

    async fn execute(&self, run: RunContext) -> RunReport {
        let mut report = RunReport::new(run.run_id);
        tracing::info!("backup started");

        report.enter(RunPhase::SourceRunning);
        if let Err(e) = self.source.fetch(&run).await {
            tracing::error!(error = %e, "source error");
            report.source_error = Some(e.to_string());
            report.enter(RunPhase::SourceFailed);
            report.enter(RunPhase::Idle);
            return report;
        }

        report.enter(RunPhase::DestinationRunning);
        let mut result = DestinationResult::default();
        match self.destination.publish(&run, &mut result).await {
            Ok(()) => tracing::info!("backup success"),
            Err(e) => {
                tracing::error!(error = %e, "backup error");
                report.destination_error = Some(e.to_string());
            }
        }
        report.result = result;

        report.enter(RunPhase::CallbackRunning);
        report.callback = self.callback(&run, result).await;

        report.enter(RunPhase::CleanupRunning);
        report.cleanup = self.cleanup(&run).await;

        report.enter(RunPhase::Idle);
        tracing::info!(
            files = result.files_uploaded,
            bytes = result.bytes_uploaded,
            "backup finished"
        );
        report
    }

    async fn callback(&self, run: &RunContext, result: DestinationResult) -> StepOutcome {
        let Some(url) = self.job.callback_url() else {
            tracing::debug!("callback none");
            return StepOutcome::Skipped;
        };

        let payload = CallbackPayload::new(
            run,
            self.job.source.kind(),
            self.job.destination.kind(),
            result,
            self.clock.now(),
        );
        match self.notify.notify(url, &payload).await {
            Ok(()) => {
                tracing::debug!("callback success");
                StepOutcome::Done
            }
            Err(e) => {
                tracing::error!(error = %e, "callback error");
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    async fn cleanup(&self, run: &RunContext) -> StepOutcome {
        if !self.job.delete_local() {
            tracing::debug!("delete_local false, keeping staging");
            return StepOutcome::Skipped;
        }
        match self.settings.staging.remove(run.run_id).await {
            Ok(()) => {
                tracing::debug!("staging cleared");
                StepOutcome::Done
            }
            Err(e) => {
                tracing::error!(error = %e, "staging clear error");
                StepOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
