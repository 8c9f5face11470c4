//! Directory merge.
//!
//! `merge_dirs(src, dst)` moves everything from `src` into `dst`, with `src`
//! winning every name collision, then removes `src`:
//!
//! | incoming (src) | existing (dst) | result                               |
//! |----------------|----------------|--------------------------------------|
//! | file           | file           | dst file deleted, src file moved in  |
//! | file           | directory      | dst tree deleted, src file moved in  |
//! | directory      | file           | dst file deleted, merged as a folder |
//! | directory      | directory      | merged recursively                   |

use std::path::Path;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::sink::LogSink;

use super::backend::{Filesystem, NodeKind};
use super::helpers::io_error_with_help;
use super::remove::remove_path;

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Ensure `path` is a directory, creating it when absent.
fn ensure_dir<F: Filesystem + ?Sized>(fs: &F, path: &Path) -> Result<()> {
    match fs.kind(path).map_err(io_error_with_help("inspect", path))? {
        Some(NodeKind::Directory) => Ok(()),
        _ => fs
            .create_dir(path)
            .map_err(io_error_with_help("create directory", path)),
    }
}

/// Merge `src` into `dst` and remove `src`. With `dry_run` only the intent
/// is reported.
pub fn merge_dirs<F, S>(fs: &F, src: &Path, dst: &Path, dry_run: bool, sink: &mut S) -> Result<()>
where
    F: Filesystem + ?Sized,
    S: LogSink + ?Sized,
{
    sink.emit(&format!(
        "      MERGE: {} -> {}",
        display_name(src),
        display_name(dst)
    ));

    if dry_run {
        sink.emit("      DRY RUN: would merge directories (with overwrites)");
        return Ok(());
    }

    ensure_dir(fs, dst)?;

    let mut entries = fs
        .read_dir(src)
        .map_err(io_error_with_help("list directory", src))?;
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    for entry in entries {
        let item = src.join(&entry.name);
        let dst_item = dst.join(&entry.name);
        let existing = fs
            .kind(&dst_item)
            .map_err(io_error_with_help("inspect", &dst_item))?;

        match entry.kind {
            NodeKind::Directory => {
                if existing == Some(NodeKind::File) {
                    sink.emit(&format!(
                        "        OVERWRITE: removing file {} to replace with folder",
                        display_name(&dst_item)
                    ));
                    remove_path(fs, &dst_item)?;
                }
                ensure_dir(fs, &dst_item)?;
                merge_dirs(fs, &item, &dst_item, false, sink)?;
            }
            NodeKind::File => {
                if existing.is_some() {
                    sink.emit(&format!("        OVERWRITE: {}", display_name(&dst_item)));
                    remove_path(fs, &dst_item)?;
                }
                fs.move_file(&item, &dst_item)
                    .map_err(io_error_with_help("move file", &item))?;
            }
        }
    }

    if fs.exists(src) {
        if let Err(e) = fs.remove_dir(src) {
            warn!(path = %src.display(), error = %e, "merge source not empty; removing remaining tree");
            remove_path(fs, src)?;
        } else {
            debug!(path = %src.display(), "merge source removed");
        }
    }

    Ok(())
}
