// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::destination::FakeDestinationAdapter;
use crate::notify::FakeNotifyAdapter;
use crate::source::FakeSourceAdapter;
use bkp_core::RunId;
use chrono::Utc;
use chrono_tz::Tz;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn run_in(dir: &Path) -> RunContext {
    RunContext {
        job_name: "nightly".into(),
        run_id: RunId(99),
        started_at: Utc::now(),
        timezone: Tz::UTC,
        staging_dir: dir.join("99"),
        date_format: "%Y".into(),
    }
}

// =============================================================================
// Precondition validation tests
// =============================================================================

#[tokio::test]
async fn traced_destination_rejects_missing_staging() {
    let tmp = tempfile::tempdir().unwrap();
    let fake = FakeDestinationAdapter::new();
    let traced = TracedDestinationAdapter::new(fake.clone(), "ftp");

    let mut result = DestinationResult::default();
    let err = traced
        .publish(&run_in(tmp.path()), &mut result)
        .await
        .unwrap_err();

    assert!(
        err.to_string().contains("staging directory does not exist"),
        "Expected error about staging, got: {}",
        err
    );
    assert!(fake.calls().is_empty());
}

// =============================================================================
// Tracing output verification tests
// =============================================================================

#[test]
fn traced_source_logs_entry_and_completion() {
    let tmp = tempfile::tempdir().unwrap();
    let run = &run_in(tmp.path());
    let (logs, result) = with_tracing(|| async move {
        let fake = FakeSourceAdapter::new().with_file("a.tar", b"a");
        TracedSourceAdapter::new(fake, "sftp").fetch(run).await
    });

    assert!(result.is_ok(), "fetch should succeed: {:?}", result);
    assert!(logs.contains("source.fetch"), "Should log span name. Logs:\n{}", logs);
    assert!(logs.contains("nightly"), "Should log job name. Logs:\n{}", logs);
    assert!(logs.contains("run_id=99"), "Should log run id. Logs:\n{}", logs);
    assert!(logs.contains("starting"), "Should log entry message. Logs:\n{}", logs);
    assert!(logs.contains("fetched"), "Should log completion. Logs:\n{}", logs);
    assert!(logs.contains("elapsed_ms"), "Should log timing. Logs:\n{}", logs);
}

#[test]
fn traced_source_logs_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let run = &run_in(tmp.path());
    let (logs, result) = with_tracing(|| async move {
        let fake = FakeSourceAdapter::new();
        fake.set_error("host unreachable");
        TracedSourceAdapter::new(fake, "ftp").fetch(run).await
    });

    assert!(result.is_err());
    assert!(logs.contains("fetch failed"), "Should log failure. Logs:\n{}", logs);
    assert!(logs.contains("host unreachable"), "Should log cause. Logs:\n{}", logs);
}

#[test]
fn traced_destination_logs_totals() {
    let tmp = tempfile::tempdir().unwrap();
    let run = &run_in(tmp.path());
    std::fs::create_dir_all(&run.staging_dir).unwrap();
    std::fs::write(run.staging_dir.join("a.tar"), b"abcd").unwrap();

    let (logs, result) = with_tracing(|| async move {
        let traced = TracedDestinationAdapter::new(FakeDestinationAdapter::new(), "sftp");
        let mut totals = DestinationResult::default();
        traced.publish(run, &mut totals).await.map(|()| totals)
    });

    assert_eq!(result.unwrap().bytes_uploaded, 4);
    assert!(logs.contains("destination.publish"), "Should log span name. Logs:\n{}", logs);
    assert!(logs.contains("published"), "Should log completion. Logs:\n{}", logs);
    assert!(logs.contains("bytes=4"), "Should log totals. Logs:\n{}", logs);
}

#[test]
fn traced_notify_warns_on_failure() {
    let (logs, result) = with_tracing(|| async move {
        let fake = FakeNotifyAdapter::new();
        fake.fail_with(503);
        let payload = CallbackPayload {
            backup_date: String::new(),
            backup_ts: 0,
            backup_id: "7".into(),
            backup_name: "nightly".into(),
            backup_source: "ftp".into(),
            backup_destination: "ftp".into(),
            backup_destination_result: DestinationResult::default(),
            backup_duration: "0s".into(),
        };
        TracedNotifyAdapter::new(fake)
            .notify("http://hooks", &payload)
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("callback.notify"), "Should log span name. Logs:\n{}", logs);
    assert!(logs.contains("WARN"), "Should warn. Logs:\n{}", logs);
    assert!(logs.contains("503"), "Should log status. Logs:\n{}", logs);
}
