// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run tracking and the shutdown drain
//!
//! Every in-flight run holds a [`RunGuard`]. On shutdown the daemon waits in
//! [`drain`] until a single check sees no guard alive. There is no deadline
//! and nothing is cancelled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Fallback re-check period while draining
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Process-wide count of in-flight runs
#[derive(Debug, Default)]
pub struct RunActivity {
    running: AtomicUsize,
    changed: Notify,
}

impl RunActivity {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of runs currently in flight
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.running() == 0
    }

    /// Mark a run as started; it ends when the guard drops
    pub fn begin(self: &Arc<Self>) -> RunGuard {
        self.running.fetch_add(1, Ordering::SeqCst);
        RunGuard {
            activity: Arc::clone(self),
            job: None,
        }
    }

    fn finish(&self) {
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.changed.notify_waiters();
    }
}

/// Held for the lifetime of one run
#[derive(Debug)]
pub struct RunGuard {
    activity: Arc<RunActivity>,
    job: Option<Arc<AtomicUsize>>,
}

impl RunGuard {
    /// Also count the run against a per-job counter
    pub(crate) fn for_job(mut self, counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        self.job = Some(counter);
        self
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(counter) = &self.job {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
        self.activity.finish();
    }
}

/// Wait until no run is in flight
pub async fn drain(activity: &RunActivity) {
    drain_every(activity, DRAIN_POLL_INTERVAL).await
}

/// [`drain`] with a custom fallback poll interval
pub async fn drain_every(activity: &RunActivity, poll: Duration) {
    let mut announced = false;
    loop {
        // register interest before checking so a completion in between is not lost
        let notified = activity.changed.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let running = activity.running();
        if running == 0 {
            if announced {
                tracing::info!("all jobs finished");
            }
            return;
        }
        if !announced {
            tracing::info!(running, "waiting for running jobs to finish");
            announced = true;
        }

        tokio::select! {
            _ = &mut notified => {}
            _ = tokio::time::sleep(poll) => {}
        }
    }
}

#[cfg(test)]
#[path = "drain_tests.rs"]
mod tests;
