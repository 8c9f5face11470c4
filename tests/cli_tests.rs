use clap::Parser;
use std::path::PathBuf;
use tree_rename::cli::Args;
use tree_rename::config::types::{Config, LogLevel};

#[test]
fn dry_run_is_the_default() {
    let args = Args::parse_from(["tree_rename", "/data"]);
    assert!(args.is_dry_run());
    assert_eq!(args.resolved_root(), Some(PathBuf::from("/data")));
}

#[test]
fn apply_turns_dry_run_off_unless_dry_run_is_explicit() {
    let args = Args::parse_from(["tree_rename", "--apply", "/data"]);
    assert!(!args.is_dry_run());

    let args = Args::parse_from(["tree_rename", "--apply", "--dry-run", "/data"]);
    assert!(args.is_dry_run());
}

#[test]
fn effective_log_level_precedence() {
    let args = Args::parse_from(["tree_rename", "--debug", "--log-level", "quiet"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Debug)); // --debug wins

    let args = Args::parse_from(["tree_rename", "--log-level", "info"]);
    assert_eq!(args.effective_log_level(), Some(LogLevel::Info));

    let args = Args::parse_from(["tree_rename", "--log-level", "shouty"]);
    assert_eq!(args.effective_log_level(), None);
}

#[test]
fn apply_overrides_sets_flags() {
    let args = Args::parse_from([
        "tree_rename",
        "--apply",
        "-y",
        "--log-level",
        "info",
        "--log-file",
        "/tmp/tree_rename.log",
        "--json",
        "/srv/media",
    ]);
    let mut cfg = Config::default();
    args.apply_overrides(&mut cfg);

    assert_eq!(cfg.root, Some(PathBuf::from("/srv/media")));
    assert!(!cfg.dry_run);
    assert!(cfg.assume_yes);
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/tree_rename.log")));
    assert!(cfg.json);
}

#[test]
fn apply_overrides_keeps_config_values_for_unset_flags() {
    let args = Args::parse_from(["tree_rename", "/srv/media"]);
    let mut cfg = Config {
        log_level: LogLevel::Debug,
        log_file: Some(PathBuf::from("/var/log/tr.log")),
        json: true,
        ..Config::default()
    };
    args.apply_overrides(&mut cfg);

    assert_eq!(cfg.log_level, LogLevel::Debug);
    assert_eq!(cfg.log_file, Some(PathBuf::from("/var/log/tr.log")));
    assert!(cfg.json);
    assert!(cfg.dry_run);
    assert!(!cfg.assume_yes);
}

#[test]
fn quoted_root_is_sanitized() {
    let args = Args::parse_from(["tree_rename", "'/srv/My Media/'"]);
    assert_eq!(args.resolved_root(), Some(PathBuf::from("/srv/My Media")));
}

#[test]
fn root_is_optional_for_print_config() {
    let args = Args::parse_from(["tree_rename", "--print-config"]);
    assert!(args.print_config);
    assert_eq!(args.resolved_root(), None);
}
