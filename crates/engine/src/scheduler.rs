// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron scheduler
//!
//! Each registered job gets a timer task that sleeps until the next fire
//! time, evaluated in the configured zone, and spawns the run as its own
//! task. Runs of the same job may overlap. [`Scheduler::stop`] ends the
//! timers; runs already spawned keep going and are tracked by
//! [`RunActivity`].

use crate::drain::{RunActivity, RunGuard};
use bkp_core::{Clock, CronSpec, ScheduleError, SystemClock};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

#[derive(Debug, Default)]
struct JobState {
    running: Arc<AtomicUsize>,
    next_run: Mutex<Option<DateTime<Tz>>>,
}

/// Handle to a registered job
#[derive(Debug, Clone)]
pub struct JobHandle {
    name: String,
    cron: CronSpec,
    state: Arc<JobState>,
    activity: Arc<RunActivity>,
}

impl JobHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cron(&self) -> &CronSpec {
        &self.cron
    }

    /// Whether at least one run of this job is in flight
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst) > 0
    }

    /// Next scheduled fire time, `None` once the schedule is exhausted or stopped
    pub fn next_run(&self) -> Option<DateTime<Tz>> {
        *self.state.next_run.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark a run of this job as started
    pub fn begin_run(&self) -> RunGuard {
        self.activity
            .begin()
            .for_job(Arc::clone(&self.state.running))
    }

    fn set_next_run(&self, next: Option<DateTime<Tz>>) {
        *self.state.next_run.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

/// Fires registered jobs on their cron schedules
pub struct Scheduler<K: Clock = SystemClock> {
    timezone: Tz,
    clock: K,
    activity: Arc<RunActivity>,
    stop: watch::Sender<bool>,
    jobs: Mutex<Vec<JobHandle>>,
}

impl Scheduler<SystemClock> {
    pub fn new(timezone: Tz) -> Self {
        Self::with_clock(timezone, SystemClock)
    }
}

impl<K: Clock> Scheduler<K> {
    pub fn with_clock(timezone: Tz, clock: K) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            timezone,
            clock,
            activity: RunActivity::new(),
            stop,
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// In-flight run tracking shared with the drain
    pub fn activity(&self) -> &Arc<RunActivity> {
        &self.activity
    }

    /// Whether any run of any job is in flight
    pub fn any_running(&self) -> bool {
        !self.activity.is_idle()
    }

    /// Registered jobs in registration order
    pub fn jobs(&self) -> Vec<JobHandle> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Schedule `run` on `cron`. Must be called from within a tokio runtime.
    pub fn register<F, Fut>(
        &self,
        name: &str,
        cron: &str,
        run: F,
    ) -> Result<JobHandle, ScheduleError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cron = CronSpec::parse(cron)?;
        let handle = JobHandle {
            name: name.to_string(),
            cron,
            state: Arc::new(JobState::default()),
            activity: Arc::clone(&self.activity),
        };

        let now = self.clock.now().with_timezone(&self.timezone);
        handle.set_next_run(handle.cron.next_after(&now));

        tokio::spawn(timer_loop(
            handle.clone(),
            self.clock.clone(),
            self.timezone,
            self.stop.subscribe(),
            run,
        ));
        tracing::debug!(name, cron = %handle.cron, "job registered");

        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle.clone());
        Ok(handle)
    }

    /// Stop firing new runs
    pub fn stop(&self) {
        self.stop.send_replace(true);
        for job in self.jobs() {
            job.set_next_run(None);
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}

async fn timer_loop<K, F, Fut>(
    handle: JobHandle,
    clock: K,
    timezone: Tz,
    mut stop: watch::Receiver<bool>,
    run: F,
) where
    K: Clock,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut last_fire: Option<DateTime<Utc>> = None;
    loop {
        if *stop.borrow() {
            break;
        }

        let now = clock.now();
        let from = match last_fire {
            Some(fired) if fired > now => fired,
            _ => now,
        };
        let Some(next) = handle.cron.next_after(&from.with_timezone(&timezone)) else {
            tracing::warn!(name = handle.name(), "cron schedule has no further fire times");
            handle.set_next_run(None);
            break;
        };
        handle.set_next_run(Some(next));

        let wait = (next.with_timezone(&Utc) - now).to_std().unwrap_or_default();
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            changed = stop.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }
        if *stop.borrow() {
            break;
        }

        last_fire = Some(next.with_timezone(&Utc));
        let guard = handle.begin_run();
        let fut = run();
        tracing::debug!(name = handle.name(), "job fired");
        tokio::spawn(async move {
            let _guard = guard;
            fut.await;
        });
    }
    tracing::debug!(name = handle.name(), "timer stopped");
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
