//! CLI integration tests: replay over CSV fixtures on disk.

mod common;

use barflow::cli::{self, Cli, ReplayArgs};
use barflow::domain::error::EngineError;
use clap::Parser;
use common::*;
use std::io::Write;
use std::process::ExitCode;
use tempfile::TempDir;

fn fixture(bars: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_csv(dir.path(), "BHP", "ASX", &generate_bars(bars, 40.0));
    write_csv(dir.path(), "CBA", "ASX", &generate_bars(5, 90.0));
    dir
}

fn replay_args<'a>(dir: &'a TempDir, indicators: &'a [String]) -> ReplayArgs<'a> {
    ReplayArgs {
        data_dir: dir.path(),
        code: "BHP",
        exchange: "ASX",
        start: None,
        end: None,
        params: None,
        indicators,
        output: None,
    }
}

mod replay {
    use super::*;

    #[test]
    fn writes_displayed_series_to_csv() {
        let dir = fixture(30);
        let out = dir.path().join("report.csv");
        let indicators = vec!["SMA(5)".to_string(), "RSI(5)".to_string()];
        let mut args = replay_args(&dir, &indicators);
        args.output = Some(out.as_path());
        cli::run_replay(&args).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("index,time,C,\"SMA(C, 5)\",\"RSI(C, 5)\""));
        assert_eq!(lines.count(), 30);
    }

    #[test]
    fn repeated_indicator_gets_one_column() {
        let dir = fixture(10);
        let out = dir.path().join("report.csv");
        let indicators = vec!["SMA(3)".to_string(), "SMA(3)".to_string()];
        let mut args = replay_args(&dir, &indicators);
        args.output = Some(out.as_path());
        cli::run_replay(&args).unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().next(), Some("index,time,C,\"SMA(C, 3)\""));
    }

    #[test]
    fn date_range_limits_the_bars() {
        let dir = fixture(30);
        let out = dir.path().join("report.csv");
        let indicators = vec!["EMA(3)".to_string()];
        let mut args = replay_args(&dir, &indicators);
        args.start = Some(date(2024, 1, 11));
        args.end = Some(date(2024, 1, 20));
        args.output = Some(out.as_path());
        cli::run_replay(&args).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 11);
    }

    #[test]
    fn params_file_feeds_the_default_panel() {
        let dir = fixture(40);
        let mut params = tempfile::NamedTempFile::new().unwrap();
        writeln!(params, "[params]\nma_period = 7\nema_period = 3\ncooldown = 2").unwrap();
        let out = dir.path().join("report.csv");
        let mut args = replay_args(&dir, &[]);
        args.params = Some(params.path());
        args.output = Some(out.as_path());
        cli::run_replay(&args).unwrap();
        let header = std::fs::read_to_string(&out).unwrap().lines().next().unwrap().to_string();
        assert!(header.contains("\"SMA(C, 7)\""), "{header}");
        assert!(header.contains("\"EMA(C, 3)\""), "{header}");
    }

    #[test]
    fn missing_symbol_is_a_data_error() {
        let dir = fixture(5);
        let mut args = replay_args(&dir, &[]);
        args.code = "XYZ";
        let err = cli::run_replay(&args).unwrap_err();
        assert!(matches!(err, EngineError::Data { .. }));
        assert_eq!(ExitCode::from(&err), ExitCode::from(3));
    }

    #[test]
    fn empty_range_is_a_data_error() {
        let dir = fixture(5);
        let mut args = replay_args(&dir, &[]);
        args.start = Some(date(2030, 1, 1));
        assert!(matches!(cli::run_replay(&args), Err(EngineError::Data { .. })));
    }

    #[test]
    fn bad_indicator_exits_with_config_code() {
        let dir = fixture(5);
        let cli = Cli::try_parse_from([
            "barflow",
            "replay",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "--code",
            "BHP",
            "--exchange",
            "ASX",
            "--indicator",
            "NOPE(3)",
        ])
        .unwrap();
        assert_eq!(cli::run(cli), ExitCode::from(2));
    }
}

mod list_symbols {
    use super::*;

    #[test]
    fn lists_symbols_for_exchange() {
        let dir = fixture(5);
        let cli = Cli::try_parse_from([
            "barflow",
            "list-symbols",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "--exchange",
            "ASX",
        ])
        .unwrap();
        assert_eq!(cli::run(cli), ExitCode::SUCCESS);
    }

    #[test]
    fn missing_directory_fails() {
        let cli = Cli::try_parse_from([
            "barflow",
            "list-symbols",
            "--data-dir",
            "/nonexistent/barflow-data",
            "--exchange",
            "ASX",
        ])
        .unwrap();
        assert_eq!(cli::run(cli), ExitCode::from(3));
    }
}
