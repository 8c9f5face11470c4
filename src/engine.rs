//! Tree walker: executes a bottom-up plan and reports progress to a sink.
//!
//! The walk itself never aborts once the root has been found. Each node
//! failure is reported, counted, and the walk moves on to the next step.

use std::path::Path;
use tracing::{debug, info, warn};

use crate::errors::{RenameError, Result};
use crate::fs_ops::{Filesystem, NodeKind, RealFs, staged_rename};
use crate::plan::{Plan, RenameIntent, Step, plan_tree};
use crate::shutdown;
use crate::sink::LogSink;

const RULE: &str = "==============================================================================";

/// Counters for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub visited_dirs: usize,
    pub visited_files: usize,
    /// Renames performed, or planned in a dry run.
    pub actions: usize,
    pub failures: usize,
    /// Entries left alone (undecodable names, sources gone before their turn).
    pub skipped: usize,
    pub interrupted: bool,
    pub dry_run: bool,
}

impl RunSummary {
    /// Closing report block.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            String::new(),
            RULE.to_string(),
            format!("Visited folders: {}", self.visited_dirs),
            format!("Visited files:   {}", self.visited_files),
            format!(
                "{} operations: {}",
                if self.dry_run { "Planned" } else { "Completed" },
                self.actions
            ),
        ];
        if self.failures > 0 {
            lines.push(format!("Failed operations: {}", self.failures));
        }
        if self.skipped > 0 {
            lines.push(format!("Skipped entries: {}", self.skipped));
        }
        if self.interrupted {
            lines.push("Run interrupted before completion".to_string());
        }
        lines.push(RULE.to_string());
        lines
    }
}

type CancelCheck = Box<dyn Fn() -> bool>;

/// Rename engine over any `Filesystem`. Dry run unless told otherwise.
pub struct Engine<F> {
    fs: F,
    dry_run: bool,
    cancelled: CancelCheck,
}

impl<F: Filesystem> Engine<F> {
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            dry_run: true,
            cancelled: Box::new(shutdown::is_requested),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace the stop check consulted before each step (defaults to the
    /// process-wide shutdown flag).
    pub fn with_cancel_check(mut self, check: impl Fn() -> bool + 'static) -> Self {
        self.cancelled = Box::new(check);
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn plan(&self, root: &Path) -> Result<Plan> {
        plan_tree(&self.fs, root)
    }

    /// Plan and execute the whole tree under `root`.
    ///
    /// Errors only with `RootNotFound`, before anything is reported. A
    /// symlinked root is followed; a dangling one counts as missing.
    pub fn run<S: LogSink + ?Sized>(&self, root: &Path, sink: &mut S) -> Result<RunSummary> {
        if !matches!(self.fs.resolve_kind(root), Ok(Some(_))) {
            return Err(RenameError::RootNotFound(root.to_path_buf()));
        }
        self.banner(root, sink);
        let plan = self.plan(root)?;
        debug!(root = %root.display(), steps = plan.steps.len(), pending = plan.pending(), "plan ready");
        Ok(self.execute(&plan, sink))
    }

    fn banner<S: LogSink + ?Sized>(&self, root: &Path, sink: &mut S) {
        sink.emit(RULE);
        sink.emit(&format!("ROOT: {}", root.display()));
        sink.emit(if self.dry_run {
            "MODE: DRY RUN"
        } else {
            "MODE: APPLY (OVERWRITE ENABLED)"
        });
        sink.emit(
            "RULES: folders -> ALL CAPS + remove ' (n)' | files -> clean '(n)', stem lower, first char upper",
        );
        sink.emit("NOTE: if target exists -> OVERWRITE (folders are MERGED with overwrites)");
        sink.emit(RULE);
    }

    /// Execute an already built plan. Reports the summary block at the end.
    pub fn execute<S: LogSink + ?Sized>(&self, plan: &Plan, sink: &mut S) -> RunSummary {
        let mut summary = RunSummary {
            dry_run: self.dry_run,
            ..RunSummary::default()
        };
        info!(root = %plan.root.display(), dry_run = self.dry_run, "rename run started");

        let mut folders_header = false;
        for step in &plan.steps {
            if (self.cancelled)() {
                summary.interrupted = true;
                sink.emit("");
                sink.emit("⚠ INTERRUPTED: stopping before the next entry");
                warn!("run interrupted by shutdown request");
                break;
            }

            match step {
                Step::Visit {
                    dir,
                    files,
                    folders: _,
                } => {
                    summary.visited_dirs += 1;
                    folders_header = false;
                    sink.emit("");
                    sink.emit("📂 Visiting folder:");
                    sink.emit(&format!("   {}", dir.display()));
                    if *files > 0 {
                        sink.emit("   📄 Files:");
                    }
                }
                Step::Rename(intent) => {
                    self.announce(intent.kind, &mut folders_header, &mut summary, sink);
                    sink.emit(&format!(
                        "    - Checking {}: {}",
                        noun(intent.kind),
                        intent.current_name()
                    ));
                    self.apply(intent, &mut summary, sink);
                }
                Step::Skip { path, kind } => {
                    self.announce(*kind, &mut folders_header, &mut summary, sink);
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    sink.emit(&format!("    - Skipping {}: {name}", noun(*kind)));
                    sink.emit("      SKIP: name is not valid UTF-8");
                    summary.skipped += 1;
                }
                Step::Unreadable { dir, error } => {
                    sink.emit("");
                    sink.emit(&format!("✖ CANNOT LIST FOLDER: {}", dir.display()));
                    sink.emit(&format!("   {error}"));
                    summary.failures += 1;
                }
            }
        }

        for line in summary.report_lines() {
            sink.emit(&line);
        }
        info!(
            visited_dirs = summary.visited_dirs,
            visited_files = summary.visited_files,
            actions = summary.actions,
            failures = summary.failures,
            skipped = summary.skipped,
            interrupted = summary.interrupted,
            "rename run finished"
        );
        summary
    }

    /// Count files and print the subfolder header before the first folder.
    fn announce<S: LogSink + ?Sized>(
        &self,
        kind: NodeKind,
        folders_header: &mut bool,
        summary: &mut RunSummary,
        sink: &mut S,
    ) {
        match kind {
            NodeKind::File => summary.visited_files += 1,
            NodeKind::Directory => {
                if !*folders_header {
                    sink.emit("   📁 Subfolders:");
                    *folders_header = true;
                }
            }
        }
    }

    fn apply<S: LogSink + ?Sized>(&self, intent: &RenameIntent, summary: &mut RunSummary, sink: &mut S) {
        if intent.is_noop() {
            return;
        }
        match self.fs.kind(&intent.src) {
            Ok(Some(_)) => {}
            Ok(None) => {
                sink.emit("      SKIP: source no longer exists");
                warn!(src = %intent.src.display(), "source vanished before rename");
                summary.skipped += 1;
                return;
            }
            Err(e) => {
                sink.emit(&format!("      ✖ OS ERROR: cannot inspect source: {e}"));
                warn!(src = %intent.src.display(), error = %e, "cannot inspect source");
                summary.failures += 1;
                return;
            }
        }

        let outcome = staged_rename(
            &self.fs,
            &intent.src,
            &intent.dst,
            self.dry_run,
            intent.kind,
            sink,
        );
        if outcome.did_rename() {
            summary.actions += 1;
        } else if outcome.is_failure() {
            summary.failures += 1;
        }
    }
}

fn noun(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::File => "file",
        NodeKind::Directory => "folder",
    }
}

/// Rename everything under `root` on the real filesystem.
///
/// ```no_run
/// use std::path::Path;
/// let mut lines = Vec::new();
/// let summary = tree_rename::rename_tree(Path::new("photos"), true, &mut |l: &str| {
///     lines.push(l.to_string())
/// })?;
/// assert!(summary.dry_run);
/// # Ok::<(), tree_rename::RenameError>(())
/// ```
pub fn rename_tree<S: LogSink + ?Sized>(root: &Path, dry_run: bool, sink: &mut S) -> Result<RunSummary> {
    Engine::new(RealFs).dry_run(dry_run).run(root, sink)
}
