// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;

const MINIMAL: &str = r#"
[[backups]]
name = "files"
cron = "*/10 * * * *"

[backups.source]
type = "ftp"
host = "files.local"
downloads = ["a.tar"]

[backups.destination]
type = "sftp"
host = "vault.local"
user = "backup"
target = "/srv/backups"
"#;

#[test]
fn defaults_apply_when_omitted() {
    let config = Config::parse(MINIMAL).unwrap();
    assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
    assert_eq!(config.log_dir, PathBuf::from("logs"));
    assert_eq!(config.staging_root, PathBuf::from("tmp"));
    assert_eq!(config.log_level, None);
    assert_eq!(config.backups.len(), 1);
}

#[test]
fn empty_config_has_no_backups() {
    let config = Config::parse("").unwrap();
    assert!(config.backups.is_empty());
}

#[test]
fn explicit_timezone_resolves() {
    let text = format!("timezone = \"Europe/Istanbul\"\n{}", MINIMAL);
    let config = Config::parse(&text).unwrap();
    assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Istanbul);
}

#[test]
fn unknown_timezone_is_rejected() {
    let text = format!("timezone = \"Mars/Olympus\"\n{}", MINIMAL);
    assert!(matches!(
        Config::parse(&text),
        Err(ConfigError::Timezone(tz)) if tz == "Mars/Olympus"
    ));
}

#[yare::parameterized(
    bad_specifier = { "%Y-%Q" },
    trailing_percent = { "%Y-%" },
    slash = { "%Y/%m/%d" },
    empty = { "" },
)]
fn invalid_date_formats_are_rejected(format: &str) {
    let text = format!("date_format = {:?}\n{}", format, MINIMAL);
    assert!(matches!(Config::parse(&text), Err(ConfigError::DateFormat(_))));
}

#[test]
fn custom_date_format_is_kept() {
    let text = format!("date_format = \"%Y%m%d\"\n{}", MINIMAL);
    assert_eq!(Config::parse(&text).unwrap().date_format, "%Y%m%d");
}

fn job_error(text: &str) -> String {
    match Config::parse(text) {
        Err(ConfigError::Job { name, reason }) => {
            assert_eq!(name, "files");
            reason
        }
        other => panic!("expected job error, got {:?}", other),
    }
}

#[test]
fn bad_cron_is_rejected() {
    let text = MINIMAL.replace("*/10 * * * *", "every ten minutes");
    assert!(job_error(&text).contains("cron"));
}

#[test]
fn empty_downloads_are_rejected() {
    let text = MINIMAL.replace("downloads = [\"a.tar\"]", "downloads = []");
    assert!(job_error(&text).contains("downloads"));
}

#[test]
fn empty_target_is_rejected() {
    let text = MINIMAL.replace("target = \"/srv/backups\"", "target = \"\"");
    assert!(job_error(&text).contains("target"));
}

#[test]
fn bad_retention_pattern_is_rejected() {
    let text = format!("{}\n[backups.destination.retention]\nolder_than = \"soon\"\n", MINIMAL);
    assert!(job_error(&text).contains("soon"));
}

#[test]
fn non_http_callback_is_rejected() {
    let text = MINIMAL.replace(
        "cron = \"*/10 * * * *\"",
        "cron = \"*/10 * * * *\"\ncallback_url = \"ftp://hooks\"",
    );
    assert!(job_error(&text).contains("callback"));
}

#[test]
fn invalid_variable_name_is_rejected() {
    let text = r#"
[[backups]]
name = "files"
cron = "0 * * * *"

[backups.source]
type = "sftp"
host = "db.local"
user = "u"
downloads = ["x"]

[backups.source.variables]
"BAD-NAME" = "1"

[backups.destination]
type = "telegram"
token = "t"
chat_id = "1"
"#;
    assert!(job_error(text).contains("BAD-NAME"));
}

#[test]
fn downloads_sharing_a_file_name_are_rejected() {
    let text = MINIMAL.replace(
        "downloads = [\"a.tar\"]",
        "downloads = [\"/site-a/db.sql\", \"/site-b/db.sql\"]",
    );
    assert!(job_error(&text).contains("/site-b/db.sql"));
}

#[yare::parameterized(
    source = { "downloads = [\"a.tar\"]", "downloads = [\"a.tar\"]\nbefor_commands = [\"true\"]", "befor_commands" },
    destination = { "target = \"/srv/backups\"", "target = \"/srv/backups\"\nretension = 3", "retension" },
)]
fn misspelled_keys_are_rejected(find: &str, replace: &str, key: &str) {
    let text = MINIMAL.replace(find, replace);
    assert!(job_error(&text).contains(key));
}

#[test]
fn unknown_top_level_key_is_rejected() {
    let text = format!("backup_dir = \"/x\"\n{}", MINIMAL);
    assert!(matches!(Config::parse(&text), Err(ConfigError::Toml(_))));
}

#[test]
fn load_reads_file_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MINIMAL.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.backups[0].name, "files");
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        Config::load(&missing),
        Err(ConfigError::Io { path, .. }) if path == missing
    ));
}
