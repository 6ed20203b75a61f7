// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn parse_job(toml_text: &str) -> Job {
    toml::from_str(toml_text).unwrap()
}

const SFTP_TO_FTP: &str = r#"
name = "db"
cron = "0 3 * * *"

[source]
type = "sftp"
host = "db.internal"
user = "backup"
pass = "secret"
before_commands = ["pg_dump app > dump.sql"]
downloads = ["dump.sql", "/etc/hosts"]
after_commands = ["rm -f dump.sql"]

[source.variables]
DB = "app"
RETRIES = 3
VERBOSE = true
RATIO = 0.5
TAGS = ["a", "b"]

[destination]
type = "ftp"
host = "storage.internal"
user = "ftp"
pass = "ftp"
target = "/backups/db"
delete_after_upload = true

[destination.retention]
max_count = 7
older_than = "30 DAYS"
"#;

#[test]
fn sftp_source_fields_decode() {
    let job = parse_job(SFTP_TO_FTP);
    assert_eq!(job.name, "db");
    assert_eq!(job.source.kind(), "sftp");
    assert_eq!(job.source.host(), "db.internal");

    let SourceConfig::Sftp(sftp) = &job.source else {
        panic!("expected sftp source");
    };
    assert_eq!(sftp.endpoint.port, 22);
    assert_eq!(sftp.endpoint.pass.as_deref(), Some("secret"));
    assert_eq!(sftp.before_commands, vec!["pg_dump app > dump.sql"]);
    assert_eq!(sftp.downloads, vec!["dump.sql", "/etc/hosts"]);
    assert_eq!(sftp.after_commands, vec!["rm -f dump.sql"]);
    assert_eq!(sftp.scratch_root(), DEFAULT_SCRATCH_ROOT);
}

#[test]
fn variables_render_only_scalars() {
    let job = parse_job(SFTP_TO_FTP);
    let SourceConfig::Sftp(sftp) = &job.source else {
        panic!("expected sftp source");
    };
    let rendered: BTreeMap<&str, Option<String>> = sftp
        .variables
        .iter()
        .map(|(k, v)| (k.as_str(), v.to_shell()))
        .collect();

    assert_eq!(rendered["DB"].as_deref(), Some("'app'"));
    assert_eq!(rendered["RETRIES"].as_deref(), Some("3"));
    assert_eq!(rendered["VERBOSE"].as_deref(), Some("true"));
    assert_eq!(rendered["RATIO"].as_deref(), Some("0.5"));
    assert_eq!(rendered["TAGS"], None);
}

#[test]
fn ftp_destination_fields_decode() {
    let job = parse_job(SFTP_TO_FTP);
    assert_eq!(job.destination.kind(), "ftp");
    assert!(job.destination.delete_after_upload());

    let DestinationKind::Ftp(ftp) = &job.destination.kind else {
        panic!("expected ftp destination");
    };
    assert_eq!(ftp.endpoint.port, 21);
    assert_eq!(ftp.target, "/backups/db");

    let retention = job.destination.retention().unwrap();
    assert_eq!(retention.count_limit(), Some(7));
    assert_eq!(retention.size_limit(), None);
    assert_eq!(retention.older_than.as_deref(), Some("30 DAYS"));
}

#[test]
fn optional_job_fields_default() {
    let job = parse_job(SFTP_TO_FTP);
    assert!(job.delete_local());
    assert_eq!(job.callback_url(), None);
}

#[test]
fn empty_callback_url_counts_as_unset() {
    let text = SFTP_TO_FTP.replace(
        "cron = \"0 3 * * *\"",
        "cron = \"0 3 * * *\"\ncallback_url = \"  \"",
    );
    assert_eq!(parse_job(&text).callback_url(), None);
}

#[test]
fn telegram_destination_decodes() {
    let job = parse_job(
        r#"
name = "tg"
cron = "*/5 * * * *"
delete_local = false
callback_url = "http://hooks.local/done"

[source]
type = "ftp"
host = "files.local"
user = "u"
pass = "p"
downloads = ["a.tar"]

[destination]
type = "telegram"
token = "123:abc"
chat_id = "-100200"
api_base = "http://127.0.0.1:9000/"
"#,
    );

    assert!(!job.delete_local());
    assert_eq!(job.callback_url(), Some("http://hooks.local/done"));
    assert_eq!(job.source.kind(), "ftp");
    assert_eq!(job.destination.kind(), "telegram");
    assert!(job.destination.retention().is_none());
    assert!(!job.destination.delete_after_upload());

    let DestinationKind::Telegram(tg) = &job.destination.kind else {
        panic!("expected telegram destination");
    };
    assert_eq!(tg.chat_id, "-100200");
    assert_eq!(tg.api_base(), "http://127.0.0.1:9000");
}

#[test]
fn telegram_api_base_defaults() {
    let tg = TelegramDestinationConfig {
        token: "t".into(),
        chat_id: "1".into(),
        api_base: None,
        extra: Default::default(),
    };
    assert_eq!(tg.api_base(), DEFAULT_TELEGRAM_API);
}

#[test]
fn unknown_source_type_is_rejected() {
    let text = SFTP_TO_FTP.replacen("type = \"sftp\"", "type = \"s3\"", 1);
    assert!(toml::from_str::<Job>(&text).is_err());
}

#[test]
fn unknown_job_key_is_rejected() {
    let text = SFTP_TO_FTP.replace("name = \"db\"", "name = \"db\"\nschedule = \"daily\"");
    assert!(toml::from_str::<Job>(&text).is_err());
}

#[yare::parameterized(
    plain = { "abc", "'abc'" },
    spaces = { "a b", "'a b'" },
    single_quote = { "it's", r"'it'\''s'" },
    dollar = { "$HOME", "'$HOME'" },
    empty = { "", "''" },
)]
fn shell_quoting(input: &str, expected: &str) {
    assert_eq!(shell_quote(input), expected);
}

#[test]
fn recognised_keys_are_not_collected_as_unknown() {
    let job = parse_job(SFTP_TO_FTP);
    assert_eq!(job.source.unknown_keys().count(), 0);
    assert_eq!(job.destination.unknown_keys().count(), 0);
}

#[test]
fn misspelled_keys_are_collected() {
    let text = SFTP_TO_FTP
        .replace("before_commands", "befor_commands")
        .replace("delete_after_upload = true", "delete_after_upload = true\nretension = 3");
    let job = parse_job(&text);
    assert_eq!(job.source.unknown_keys().collect::<Vec<_>>(), vec!["befor_commands"]);
    assert_eq!(job.destination.unknown_keys().collect::<Vec<_>>(), vec!["retension"]);
    assert!(job.destination.delete_after_upload());
}
