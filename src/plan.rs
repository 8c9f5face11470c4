//! Bottom-up rename planner.
//!
//! Walks a tree through a `Filesystem` and produces the ordered list of steps
//! the engine executes. Order is post-order depth-first:
//!
//! 1. every subdirectory of `dir` is planned completely (recursively),
//! 2. then `dir` itself is visited,
//! 3. then each file child of `dir` gets a rename intent,
//! 4. then each folder child of `dir` gets a rename intent.
//!
//! A folder is therefore never renamed before everything inside it is
//! settled, so paths recorded for its descendants stay valid. Children are
//! ordered by name so plans are reproducible.

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::errors::{RenameError, Result};
use crate::fs_ops::{Filesystem, NodeKind, io_error_with_help};
use crate::naming::{file_name_rule, folder_name_rule};

/// Rename `src` to `dst` (same parent). May be a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameIntent {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub kind: NodeKind,
}

impl RenameIntent {
    /// Current name already equals the desired one.
    pub fn is_noop(&self) -> bool {
        self.src.file_name() == self.dst.file_name()
    }

    pub fn current_name(&self) -> Cow<'_, str> {
        self.src
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }

    pub fn desired_name(&self) -> Cow<'_, str> {
        self.dst
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Start of one directory's own level; its subtree is already planned.
    Visit {
        dir: PathBuf,
        files: usize,
        folders: usize,
    },
    Rename(RenameIntent),
    /// Entry left alone because its name cannot be processed as text.
    Skip { path: PathBuf, kind: NodeKind },
    /// Directory whose children could not be listed.
    Unreadable { dir: PathBuf, error: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub root: PathBuf,
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn intents(&self) -> impl Iterator<Item = &RenameIntent> {
        self.steps.iter().filter_map(|s| match s {
            Step::Rename(intent) => Some(intent),
            _ => None,
        })
    }

    /// Intents that would actually change a name.
    pub fn pending(&self) -> usize {
        self.intents().filter(|i| !i.is_noop()).count()
    }
}

/// Desired name for an entry of the given kind.
pub fn desired_name(name: &str, kind: NodeKind) -> String {
    match kind {
        NodeKind::File => file_name_rule(name),
        NodeKind::Directory => folder_name_rule(name),
    }
}

/// Plan the whole tree under `root`. The root itself is never renamed.
///
/// A symlinked root is followed. Fails only with `RootNotFound` (also when
/// the root cannot be inspected or is a dangling link). A root that is a
/// file yields an empty plan.
pub fn plan_tree<F: Filesystem + ?Sized>(fs: &F, root: &Path) -> Result<Plan> {
    let kind = match fs.resolve_kind(root) {
        Ok(Some(kind)) => kind,
        Ok(None) => return Err(RenameError::RootNotFound(root.to_path_buf())),
        Err(e) => {
            warn!(root = %root.display(), error = %e, "cannot inspect root");
            return Err(RenameError::RootNotFound(root.to_path_buf()));
        }
    };

    let mut plan = Plan {
        root: root.to_path_buf(),
        steps: Vec::new(),
    };
    if kind.is_dir() {
        plan_dir(fs, root, &mut plan.steps);
    } else {
        debug!(root = %root.display(), "root is not a directory; nothing to walk");
    }
    Ok(plan)
}

fn plan_dir<F: Filesystem + ?Sized>(fs: &F, dir: &Path, steps: &mut Vec<Step>) {
    let mut entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            let error = io_error_with_help("list directory", dir)(e).to_string();
            warn!(dir = %dir.display(), %error, "skipping unreadable directory");
            steps.push(Step::Unreadable {
                dir: dir.to_path_buf(),
                error,
            });
            return;
        }
    };
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let (mut folders, leaves): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.kind.is_dir());

    for folder in &folders {
        plan_dir(fs, &dir.join(&folder.name), steps);
    }

    // Links to directories are renamed as folders but never descended into.
    let (linked, files): (Vec<_>, Vec<_>) = leaves.into_iter().partition(|e| e.link_to_dir);
    if !linked.is_empty() {
        folders.extend(linked);
        folders.sort_by(|a, b| a.name.cmp(&b.name));
    }

    steps.push(Step::Visit {
        dir: dir.to_path_buf(),
        files: files.len(),
        folders: folders.len(),
    });

    for entry in files.iter().chain(folders.iter()) {
        let src = dir.join(&entry.name);
        match entry.name.to_str() {
            Some(name) => steps.push(Step::Rename(RenameIntent {
                dst: dir.join(desired_name(name, entry.naming_kind())),
                src,
                kind: entry.naming_kind(),
            })),
            None => steps.push(Step::Skip {
                path: src,
                kind: entry.naming_kind(),
            }),
        }
    }
}
