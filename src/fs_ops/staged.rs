//! Staged rename: `src -> __tmp__<uuid>__<name> -> final`.
//!
//! Moving through a temporary sibling first means a case-only rename on a
//! case-insensitive volume, or a rename onto an occupied name, never has a
//! moment where the old and new identities alias each other.
//!
//! Collision rules when `final` already exists after staging:
//! - staged folder, existing file: delete the file, rename into place.
//! - staged folder, existing folder: merge the staged folder into it.
//! - staged file, existing anything: delete it wholesale, rename into place.
//!
//! On failure a single rollback (`tmp -> src`) is attempted when the temp
//! still exists and the source name is free again.

use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{RenameError, Result};
use crate::sink::LogSink;

use super::backend::{Filesystem, NodeKind};
use super::helpers::io_error_with_help;
use super::merge::merge_dirs;
use super::remove::remove_path;

/// Marker every temporary staging name starts with.
pub const TEMP_PREFIX: &str = "__tmp__";

/// What happened to the staged copy after a failed rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rollback {
    /// Nothing to undo (failure happened before the source moved).
    NotNeeded,
    /// The temp was renamed back to the original name.
    Restored,
    /// The temp could not be renamed back; the node sits under its temp name
    /// (or partially merged) and needs manual attention.
    Failed,
}

/// Result of one staged rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Already has the desired name.
    Unchanged,
    /// Dry run: would rename; `overwrite` when the destination exists.
    Planned { overwrite: bool },
    Renamed,
    Failed { rollback: Rollback },
}

impl StageOutcome {
    /// True when an action was performed (or would be, in a dry run).
    pub fn did_rename(self) -> bool {
        matches!(self, StageOutcome::Planned { .. } | StageOutcome::Renamed)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Longest prefix of the original name kept in a temp name, in bytes.
const TEMP_NAME_KEEP: usize = 64;

/// Longest prefix of `name` no longer than `max` bytes, cut on a char boundary.
fn clip(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Temporary sibling of `src`: `__tmp__<32 hex>__<name prefix>`.
///
/// At most 64 bytes of the original name are kept, so a name that fits
/// NAME_MAX still fits once staged.
pub fn temp_sibling(src: &Path) -> PathBuf {
    let name = name_of(src);
    let tmp_name = format!(
        "{}{}__{}",
        TEMP_PREFIX,
        Uuid::new_v4().simple(),
        clip(&name, TEMP_NAME_KEEP)
    );
    match src.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}

/// Rename `src` to `final_dst` via a temporary name, overwriting or merging
/// when `final_dst` is taken. Never panics or propagates: failures are
/// reported to `sink` and returned as `StageOutcome::Failed`.
pub fn staged_rename<F, S>(
    fs: &F,
    src: &Path,
    final_dst: &Path,
    dry_run: bool,
    kind: NodeKind,
    sink: &mut S,
) -> StageOutcome
where
    F: Filesystem + ?Sized,
    S: LogSink + ?Sized,
{
    if src.file_name() == final_dst.file_name() {
        return StageOutcome::Unchanged;
    }

    let tmp = temp_sibling(src);

    sink.emit(&format!("      FROM: {}", name_of(src)));
    sink.emit(&format!("      TMP:  {}", name_of(&tmp)));
    sink.emit(&format!("      TO:   {}", name_of(final_dst)));

    if dry_run {
        let overwrite = fs.exists(final_dst);
        if overwrite {
            sink.emit(&format!("      NOTE: target exists -> would OVERWRITE ({kind})"));
        }
        sink.emit(&format!("      DRY RUN: would rename {kind} via temp"));
        return StageOutcome::Planned { overwrite };
    }

    match commit(fs, src, &tmp, final_dst, kind, sink) {
        Ok(()) => {
            sink.emit(&format!("      ✔ RENAMED {kind}"));
            info!(src = %src.display(), dest = %final_dst.display(), kind = %kind, "renamed");
            StageOutcome::Renamed
        }
        Err(e) => {
            if e.is_permission_denied() {
                sink.emit(&format!("      ✖ PERMISSION ERROR: {e}"));
            } else {
                sink.emit(&format!("      ✖ OS ERROR: {e}"));
            }
            warn!(code = e.code(), kind = e.kind(), src = %src.display(), tmp = %tmp.display(), dest = %final_dst.display(), error = %e, "staged rename failed");
            let rollback = roll_back(fs, src, &tmp, final_dst, sink);
            StageOutcome::Failed { rollback }
        }
    }
}

/// Phase 1 (`src -> tmp`) then phase 2 (`tmp -> final_dst` with collision rules).
fn commit<F, S>(
    fs: &F,
    src: &Path,
    tmp: &Path,
    final_dst: &Path,
    kind: NodeKind,
    sink: &mut S,
) -> Result<()>
where
    F: Filesystem + ?Sized,
    S: LogSink + ?Sized,
{
    fs.rename(src, tmp)
        .map_err(io_error_with_help("stage rename", src))?;

    let existing = fs
        .kind(final_dst)
        .map_err(io_error_with_help("inspect", final_dst))?;
    let Some(existing) = existing else {
        return fs
            .rename(tmp, final_dst)
            .map_err(io_error_with_help("commit rename", tmp));
    };

    sink.emit(&format!("      TARGET EXISTS -> OVERWRITE ({kind})"));

    let staged = fs
        .kind(tmp)
        .map_err(io_error_with_help("inspect", tmp))?
        .unwrap_or(kind);

    match (staged, existing) {
        (NodeKind::Directory, NodeKind::Directory) => merge_dirs(fs, tmp, final_dst, false, sink),
        (NodeKind::Directory, NodeKind::File) => {
            sink.emit("      OVERWRITE: removing file to replace with folder");
            remove_path(fs, final_dst)?;
            fs.rename(tmp, final_dst)
                .map_err(io_error_with_help("commit rename", tmp))
        }
        (NodeKind::File, _) => {
            remove_path(fs, final_dst)?;
            fs.rename(tmp, final_dst)
                .map_err(io_error_with_help("commit rename", tmp))
        }
    }
}

/// Put `tmp` back at `src` if that is both possible and necessary.
fn roll_back<F, S>(fs: &F, src: &Path, tmp: &Path, final_dst: &Path, sink: &mut S) -> Rollback
where
    F: Filesystem + ?Sized,
    S: LogSink + ?Sized,
{
    if !fs.exists(tmp) || fs.exists(src) {
        return Rollback::NotNeeded;
    }

    match fs.rename(tmp, src) {
        Ok(()) => {
            sink.emit(&format!("      ↺ ROLLED BACK: {} -> {}", name_of(tmp), name_of(src)));
            info!(src = %src.display(), tmp = %tmp.display(), "rollback restored source");
            Rollback::Restored
        }
        Err(source) => {
            let err = RenameError::RollbackFailed {
                src: src.to_path_buf(),
                tmp: tmp.to_path_buf(),
                source,
            };
            sink.emit(&format!("      ✖ ROLLBACK FAILED: {err}"));
            sink.emit(&format!(
                "      MANUAL FIX NEEDED: '{}' was meant to become '{}' (originally '{}')",
                tmp.display(),
                final_dst.display(),
                src.display()
            ));
            error!(code = err.code(), kind = err.kind(), src = %src.display(), tmp = %tmp.display(), dest = %final_dst.display(), error = %err, "rollback failed");
            Rollback::Failed
        }
    }
}
