// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn context(format: &str, tz: Tz) -> RunContext {
    RunContext {
        job_name: "db".into(),
        run_id: RunId(1_700_000_000_000_000_000),
        started_at: Utc.with_ymd_and_hms(2024, 3, 9, 22, 15, 30).unwrap(),
        timezone: tz,
        staging_dir: PathBuf::from("tmp/1700000000000000000"),
        date_format: format.into(),
    }
}

#[yare::parameterized(
    compressed = { "tmp/1/dump.sql.gz", "dump.sql-2024-03-09_22-15-30.gz" },
    plain = { "tmp/1/archive.tar", "archive-2024-03-09_22-15-30.tar" },
    no_extension = { "tmp/1/README", "README-2024-03-09_22-15-30" },
    dotfile = { "tmp/1/.env", "-2024-03-09_22-15-30.env" },
    trailing_dot = { "tmp/1/notes.", "notes-2024-03-09_22-15-30." },
)]
fn remote_names_insert_timestamp_before_extension(local: &str, expected: &str) {
    let run = context("%Y-%m-%d_%H-%M-%S", Tz::UTC);
    assert_eq!(run.remote_file_name(Path::new(local)), expected);
}

#[test]
fn start_time_uses_configured_zone() {
    let run = context("%Y%m%d-%H%M", chrono_tz::Europe::Istanbul);
    assert_eq!(run.formatted_start(), "20240310-0115");
}

#[test]
fn destination_result_accumulates() {
    let mut result = DestinationResult::default();
    result.record(10);
    result.record(5);
    assert_eq!(
        result,
        DestinationResult {
            files_uploaded: 2,
            bytes_uploaded: 15
        }
    );
}

#[test]
fn callback_payload_serializes_wire_names() {
    let run = context("%Y", Tz::UTC);
    let result = DestinationResult {
        files_uploaded: 1,
        bytes_uploaded: 2048,
    };
    let finished = run.started_at + chrono::Duration::milliseconds(61_500);

    let payload = CallbackPayload::new(&run, "sftp", "ftp", result, finished);
    let json = serde_json::to_value(&payload).unwrap();

    assert_eq!(json["backup_date"], "2024-03-09T22:15:30+00:00");
    assert_eq!(json["backup_ts"], 1_710_022_530);
    assert_eq!(json["backup_id"], "1700000000000000000");
    assert_eq!(json["backup_name"], "db");
    assert_eq!(json["backup_source"], "sftp");
    assert_eq!(json["backup_destination"], "ftp");
    assert_eq!(json["backup_destination_result"]["totalUploadedFiles"], 1);
    assert_eq!(json["backup_destination_result"]["totalUploadedSize"], 2048);
    assert_eq!(json["backup_duration"], "1m 1s 500ms");
}

#[test]
fn negative_elapsed_clamps_to_zero() {
    let run = context("%Y", Tz::UTC);
    let before = run.started_at - chrono::Duration::seconds(5);
    let payload = CallbackPayload::new(&run, "ftp", "telegram", DestinationResult::default(), before);
    assert_eq!(payload.backup_duration, "0s");
}
