//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - Dry run is the default; `--apply` mutates, and `--dry-run` wins over it.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::{Path, PathBuf};

use crate::config::types::{Config, LogLevel};

/// Recursively rename files and folders under ROOT, bottom-up.
/// Folders become ALL CAPS, files get a capitalised first letter and a
/// lowercase remainder, and trailing " (n)" counters are removed.
/// CLI flags override config values (which are loaded from XML if present).
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Recursive renamer: folders ALL CAPS, files first-char caps (rest lowercase), remove '(n)', overwrite enabled."
)]
pub struct Args {
    /// Root folder to process (the root itself is not renamed).
    #[arg(value_name = "ROOT", value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Apply changes. Without this flag nothing is modified.
    #[arg(long, help = "Apply changes (default is dry run)")]
    pub apply: bool,

    /// Force a dry run even when --apply is given.
    #[arg(
        long,
        help = "Show what would be done, but do not modify files/directories (wins over --apply)"
    )]
    pub dry_run: bool,

    /// Skip the confirmation prompt when applying.
    #[arg(short = 'y', long = "yes", help = "Do not ask for confirmation before applying")]
    pub yes: bool,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Also write diagnostics and the report to this file.
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,

    /// Emit diagnostics in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit diagnostics in structured JSON")]
    pub json: bool,

    /// Print where the config file is looked up, then exit.
    #[arg(long, help = "Print the config file location and exit")]
    pub print_config: bool,
}

impl Args {
    /// ROOT with stray shell quoting removed.
    pub fn resolved_root(&self) -> Option<PathBuf> {
        self.root.as_deref().map(Self::sanitize_path)
    }

    #[inline]
    fn sanitize_path(p: &Path) -> PathBuf {
        Self::sanitize_str(&p.to_string_lossy())
    }

    #[inline]
    fn sanitize_str(s: &str) -> PathBuf {
        // Trim surrounding single/double quotes left by PowerShell or CMD,
        // plus any unmatched quote caused by shell escaping mistakes.
        let trimmed = s.trim();
        let mut inner = if trimmed.len() >= 2
            && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
                || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
        {
            trimmed[1..trimmed.len() - 1].to_string()
        } else {
            trimmed.trim_matches(|c| c == '\'' || c == '"').to_string()
        };

        // A quoted Windows path often keeps a trailing backslash; drop one
        // trailing separator but never reduce the path to nothing.
        if (inner.ends_with('\\') || inner.ends_with('/')) && inner.len() > 1 {
            inner.pop();
        }

        PathBuf::from(inner)
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Dry run unless `--apply` was given without `--dry-run`.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run || !self.apply
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(root) = self.resolved_root() {
            cfg.root = Some(root);
        }
        cfg.dry_run = self.is_dry_run();
        if self.yes {
            cfg.assume_yes = true;
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(path) = &self.log_file {
            cfg.log_file = Some(path.clone());
        }
        if self.json {
            cfg.json = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
