use super::*;

use std::io::Write as _;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.max_body_bytes.get(), 256 * 1024);
    assert_eq!(settings.ingest.timeout, Duration::from_secs(10));
    assert_eq!(settings.ingest.write_timeout(), Duration::from_secs(8));
    assert_eq!(settings.ingest.default_environment, "production");
    assert_eq!(settings.report.default_days.get(), 30);
    assert!(settings.database.url.is_none());
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.ingest.timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("invalid timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "ingest.timeout_seconds",
            ..
        }
    ));
}

#[test]
fn blank_default_environment_is_rejected() {
    let mut raw = RawSettings::default();
    raw.ingest.default_environment = Some("  ".into());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_database_url_is_treated_as_absent() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".into());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn config_file_is_overridden_by_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        "[server]\nport = 9000\n\n[ingest]\ntimeout_seconds = 3\ndefault_environment = \"staging\""
    )
    .expect("write config");

    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "deployledger",
        "--config-file",
        path.as_str(),
        "serve",
        "--server-port",
        "9100",
    ]);

    let settings = load(&args).expect("settings load");
    assert_eq!(settings.server.addr.port(), 9100);
    assert_eq!(settings.ingest.timeout, Duration::from_secs(3));
    assert_eq!(settings.ingest.default_environment, "staging");
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["deployledger"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_replay_arguments() {
    let args = CliArgs::parse_from([
        "deployledger",
        "replay",
        "--source",
        "lifecycle",
        "--database-url",
        "postgres://example",
        "/tmp/event.json",
    ]);

    match args.command.expect("replay command") {
        Command::Replay(replay) => {
            assert_eq!(replay.source, ReplaySource::Lifecycle);
            assert_eq!(
                replay.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(replay.file, std::path::Path::new("/tmp/event.json"));
            assert!(replay.idempotency_key.is_none());
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_report_arguments() {
    let args = CliArgs::parse_from([
        "deployledger",
        "report",
        "--days",
        "7",
        "--environment",
        "production",
        "--environment",
        "staging",
    ]);

    match args.command.expect("report command") {
        Command::Report(report) => {
            assert_eq!(report.days, Some(7));
            assert_eq!(report.environments, vec!["production", "staging"]);
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn report_days_are_bounded() {
    let err = CliArgs::try_parse_from(["deployledger", "report", "--days", "5000000"])
        .expect_err("window too long");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

    let err = CliArgs::try_parse_from(["deployledger", "report", "--days", "0"])
        .expect_err("empty window");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

    let mut raw = RawSettings::default();
    raw.report.default_days = Some(MAX_REPORT_DAYS + 1);
    let err = Settings::from_raw(raw).expect_err("default window too long");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "report.default_days",
            ..
        }
    ));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "deployledger",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--ingest-timeout-seconds",
        "5",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.ingest_timeout_seconds, Some(5));
        }
        _ => panic!("wrong command parsed"),
    }
}
