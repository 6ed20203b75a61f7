// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bkp_adapters::{
    FakeDestinationAdapter, FakeNotifyAdapter, FakeRemote, FakeSourceAdapter, RemoteDestination,
    SftpSource,
};
use bkp_core::{FakeClock, RetentionPolicy, SourceConfig, TimestampIdGen};
use chrono::{TimeZone, Utc};
use std::path::Path;

/// Hands every job the same pre-built adapters
#[derive(Clone)]
struct StaticAdapters<S, D> {
    source: S,
    destination: D,
    notify: FakeNotifyAdapter,
}

impl<S: SourceAdapter, D: DestinationAdapter> JobAdapters for StaticAdapters<S, D> {
    type Source = S;
    type Destination = D;
    type Notify = FakeNotifyAdapter;

    fn source(&self, _job: &Job) -> S {
        self.source.clone()
    }

    fn destination(&self, _job: &Job) -> D {
        self.destination.clone()
    }

    fn notify(&self) -> FakeNotifyAdapter {
        self.notify.clone()
    }
}

fn job(extra: &str) -> Job {
    let text = format!(
        r#"
name = "db"
cron = "0 3 * * *"
{}

[source]
type = "sftp"
host = "db.local"
user = "backup"
before_commands = ["pg_dump app > $BACKUP_DIR/dump.sql"]
downloads = ["dump.sql", "missing.sql"]

[destination]
type = "ftp"
host = "vault.local"
target = "/backups"
"#,
        extra
    );
    toml::from_str(&text).unwrap()
}

fn settings(root: &Path) -> RunSettings {
    RunSettings {
        staging: StagingArea::new(root),
        timezone: Tz::UTC,
        date_format: "%Y-%m-%d".into(),
    }
}

fn clock() -> FakeClock {
    FakeClock::at(Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap())
}

struct Fakes {
    source: FakeSourceAdapter,
    destination: FakeDestinationAdapter,
    notify: FakeNotifyAdapter,
}

fn fakes() -> Fakes {
    Fakes {
        source: FakeSourceAdapter::new().with_file("dump.sql", b"SELECT 1;"),
        destination: FakeDestinationAdapter::new(),
        notify: FakeNotifyAdapter::new(),
    }
}

fn runner(
    job: Job,
    root: &Path,
    fakes: &Fakes,
) -> JobRunner<StaticAdapters<FakeSourceAdapter, FakeDestinationAdapter>, FakeClock, TimestampIdGen>
{
    let adapters = StaticAdapters {
        source: fakes.source.clone(),
        destination: fakes.destination.clone(),
        notify: fakes.notify.clone(),
    };
    JobRunner::new(job, settings(root), &adapters, clock(), TimestampIdGen::new())
}

#[tokio::test]
async fn source_failure_skips_remaining_steps() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    fakes.source.set_error("connection refused");
    let runner = runner(job(r#"callback_url = "http://hooks/done""#), tmp.path(), &fakes);

    let report = runner.run().await;

    assert_eq!(
        report.phases,
        vec![RunPhase::SourceRunning, RunPhase::SourceFailed, RunPhase::Idle]
    );
    assert!(report.source_error.unwrap().contains("connection refused"));
    assert!(fakes.destination.calls().is_empty());
    assert!(fakes.notify.calls().is_empty());
    assert_eq!(report.cleanup, StepOutcome::Skipped);
}

#[tokio::test]
async fn destination_failure_still_notifies_and_cleans_up() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    fakes.destination.set_error("disk full");
    let runner = runner(job(r#"callback_url = "http://hooks/done""#), tmp.path(), &fakes);

    let report = runner.run().await;

    assert_eq!(
        report.phases,
        vec![
            RunPhase::SourceRunning,
            RunPhase::DestinationRunning,
            RunPhase::CallbackRunning,
            RunPhase::CleanupRunning,
            RunPhase::Idle,
        ]
    );
    assert!(!report.succeeded());
    assert_eq!(fakes.notify.calls().len(), 1);
    assert_eq!(report.callback, StepOutcome::Done);
    assert_eq!(report.cleanup, StepOutcome::Done);
    assert!(!tmp.path().join(report.run_id.to_string()).exists());
}

#[tokio::test]
async fn successful_run_reports_totals_to_callback() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    let runner = runner(job(r#"callback_url = "http://hooks/done""#), tmp.path(), &fakes);

    let report = runner.run().await;

    assert!(report.succeeded());
    let calls = fakes.notify.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].url, "http://hooks/done");
    let payload = &calls[0].payload;
    assert_eq!(payload.backup_name, "db");
    assert_eq!(payload.backup_id, report.run_id.to_string());
    assert_eq!(payload.backup_source, "sftp");
    assert_eq!(payload.backup_destination, "ftp");
    assert_eq!(payload.backup_destination_result.files_uploaded, 1);
    assert_eq!(payload.backup_destination_result.bytes_uploaded, 9);
    assert_eq!(payload.backup_date, "2024-06-01T03:00:00+00:00");

    let uploads = fakes.destination.calls();
    assert_eq!(uploads[0].files, vec!["dump-2024-06-01.sql".to_string()]);
}

#[tokio::test]
async fn missing_callback_url_skips_notification() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    let runner = runner(job(""), tmp.path(), &fakes);

    let report = runner.run().await;

    assert_eq!(report.callback, StepOutcome::Skipped);
    assert!(report.phases.contains(&RunPhase::CallbackRunning));
    assert!(fakes.notify.calls().is_empty());
}

#[tokio::test]
async fn callback_failure_does_not_stop_cleanup() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    fakes.notify.fail_with(500);
    let runner = runner(job(r#"callback_url = "http://hooks/done""#), tmp.path(), &fakes);

    let report = runner.run().await;

    assert!(matches!(report.callback, StepOutcome::Failed(ref e) if e.contains("500")));
    assert_eq!(report.cleanup, StepOutcome::Done);
    assert!(report.succeeded());
}

#[tokio::test]
async fn delete_local_false_keeps_staging() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    let runner = runner(job("delete_local = false"), tmp.path(), &fakes);

    let report = runner.run().await;

    assert_eq!(report.cleanup, StepOutcome::Skipped);
    let staged = tmp.path().join(report.run_id.to_string()).join("dump.sql");
    assert!(staged.is_file());
}

#[tokio::test]
async fn run_ids_strictly_increase() {
    let tmp = tempfile::tempdir().unwrap();
    let fakes = fakes();
    // the clock never moves, so ids cannot come from the timestamp alone
    let runner = runner(job(""), tmp.path(), &fakes);

    let first = runner.run().await.run_id;
    let second = runner.run().await.run_id;
    let third = runner.run().await.run_id;

    assert!(first < second && second < third);
    let staged: Vec<RunId> = fakes.source.calls().iter().map(|c| c.run_id).collect();
    assert_eq!(staged, vec![first, second, third]);
}

#[tokio::test]
async fn sftp_to_ftp_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let job = job("");
    let SourceConfig::Sftp(sftp) = &job.source else {
        panic!("expected sftp source");
    };

    let db_host = FakeRemote::new();
    let vault = FakeRemote::new();
    let adapters = StaticAdapters {
        source: SftpSource::new(db_host.clone(), sftp.clone()),
        destination: RemoteDestination::new(
            vault.clone(),
            "/backups",
            RetentionPolicy::default(),
            false,
        ),
        notify: FakeNotifyAdapter::new(),
    };

    let ids = TimestampIdGen::new();
    let clock = clock();
    let run_id = ids.next(clock.now());
    // the dump exists only once before_commands "ran"; place it up front
    let next = RunId(run_id.as_i64() + 1);
    db_host.add_file(
        &format!("/tmp/backupper/{}/dump.sql", next),
        b"CREATE TABLE t;",
        Utc::now(),
    );

    let runner = JobRunner::new(job.clone(), settings(tmp.path()), &adapters, clock, ids);
    let report = runner.run().await;

    assert_eq!(report.run_id, next);
    assert!(report.succeeded(), "{:?}", report);
    assert_eq!(report.result.files_uploaded, 1);
    assert_eq!(report.result.bytes_uploaded, 15);
    assert_eq!(vault.files(), vec!["/backups/dump-2024-06-01.sql".to_string()]);
    assert_eq!(db_host.scripts().len(), 1);
    assert!(!tmp.path().join(next.to_string()).exists());
}
