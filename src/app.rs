//! Application orchestrator.
//! Loads/merges config, initializes logging, installs the signal handler,
//! asks for confirmation before destructive runs, and invokes the engine.

use anyhow::{Context, Result, bail};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use tree_rename::cli::Args;
use tree_rename::config::{CONFIG_ENV, Config, default_config_path, load_config};
use tree_rename::output as out;
use tree_rename::sink::{StdoutSink, TeeSink, TracingSink};
use tree_rename::{RenameError, RunSummary, rename_tree, shutdown};

use crate::logging::init_tracing;

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    // Handle --print-config before logging init
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    // XML values first, then CLI overrides on top.
    let mut cfg = load_config()?.unwrap_or_default();
    args.apply_overrides(&mut cfg);

    // Initialize logging and keep the guard alive until the report is flushed
    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), cfg.json).inspect_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e:#}"));
    })?;

    ctrlc::set_handler(|| {
        shutdown::request();
        out::print_warn("Received interrupt; finishing the current entry, then stopping...");
    })
    .context("install Ctrl-C handler")?;

    debug!(?cfg, "starting tree_rename");

    let result = execute(&cfg);

    // Ensure logs are flushed before exit
    drop(guard);

    result
}

fn print_config_location() {
    if let Some(cfg_env) = std::env::var_os(CONFIG_ENV) {
        out::print_info(&format!(
            "Using {CONFIG_ENV} (explicit):\n  {}\n",
            Path::new(&cfg_env).display()
        ));
        out::print_info(&format!("To override, unset {CONFIG_ENV} or set it to another file."));
    }
    match default_config_path() {
        Ok(p) => {
            out::print_info(&format!("tree_rename config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info(
                    "No config file exists there; built-in defaults apply. Example:\n\n<config>\n  <log_level>normal</log_level>\n  <log_file>/path/to/tree_rename.log</log_file>\n  <json>false</json>\n</config>\n",
                );
            }
        }
        Err(e) => out::print_error(&format!("Could not determine a config path: {e:#}")),
    }
}

fn execute(cfg: &Config) -> Result<()> {
    let Some(root) = cfg.root.as_deref() else {
        bail!("missing ROOT argument (see --help)");
    };

    // Fail fast before asking anything when the root is missing (or a dangling link).
    if std::fs::metadata(root).is_err() {
        return Err(report_error(RenameError::RootNotFound(root.to_path_buf())));
    }
    // dunce keeps Windows paths free of the \\?\ prefix.
    let root: PathBuf = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());

    if !cfg.dry_run && !cfg.assume_yes {
        confirm_apply(&root)?;
    }

    let outcome = if cfg.log_file.is_some() {
        rename_tree(&root, cfg.dry_run, &mut TeeSink::new(StdoutSink, TracingSink))
    } else {
        rename_tree(&root, cfg.dry_run, &mut StdoutSink)
    };

    match outcome {
        Ok(summary) => finish(&root, summary),
        Err(e) => Err(report_error(e)),
    }
}

/// Destructive runs need an explicit "yes" from a human, or `--yes`.
fn confirm_apply(root: &Path) -> Result<()> {
    if !out::stdin_is_tty() {
        bail!("refusing to apply changes without confirmation: stdin is not a terminal (pass --yes to proceed)");
    }
    out::print_warn("Apply mode renames in place: colliding files are OVERWRITTEN and colliding folders are MERGED.");
    let question = format!("Rename everything under '{}'?", root.display());
    let accepted = out::confirm(&question, &mut io::stdin().lock()).context("read confirmation")?;
    if !accepted {
        bail!("aborted: confirmation declined");
    }
    Ok(())
}

fn finish(root: &Path, summary: RunSummary) -> Result<()> {
    info!(
        root = %root.display(),
        actions = summary.actions,
        failures = summary.failures,
        dry_run = summary.dry_run,
        "run complete"
    );
    if summary.interrupted {
        return Err(report_error(RenameError::Interrupted));
    }
    if summary.failures > 0 {
        out::print_warn(&format!(
            "{} operation(s) failed; see the report above for details.",
            summary.failures
        ));
    } else if summary.dry_run && summary.actions > 0 {
        out::print_info("Dry run only. Re-run with --apply to make these changes.");
    } else if !summary.dry_run {
        out::print_success("All entries processed.");
    }
    Ok(())
}

fn report_error(e: RenameError) -> anyhow::Error {
    let code = e.code();
    match &e {
        RenameError::RootNotFound(path) => {
            error!(code, kind = e.kind(), path = %path.display(), "Root not found")
        }
        RenameError::Interrupted => error!(code, kind = e.kind(), "Run aborted by user"),
        _ => error!(code, kind = e.kind(), error = %e, "Run failed"),
    }
    e.into()
}
