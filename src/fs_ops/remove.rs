//! Path removal: delete a file or a whole directory tree.
//! Already-absent targets are fine; they may have gone in an earlier step.

use std::io;
use std::path::Path;
use tracing::debug;

use crate::errors::Result;

use super::backend::{Filesystem, NodeKind};
use super::helpers::io_error_with_help;

/// Delete `target` (file, or directory with everything below it).
/// No-op when it does not exist.
pub fn remove_path<F: Filesystem + ?Sized>(fs: &F, target: &Path) -> Result<()> {
    let kind = fs
        .kind(target)
        .map_err(io_error_with_help("inspect", target))?;

    let (op, result) = match kind {
        None => {
            debug!(path = %target.display(), "remove: already absent");
            return Ok(());
        }
        Some(NodeKind::Directory) => ("remove directory tree", fs.remove_dir_all(target)),
        Some(NodeKind::File) => ("remove file", fs.remove_file(target)),
    };

    match result {
        Ok(()) => Ok(()),
        // Vanished between the check and the delete.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(io_error_with_help(op, target)(e)),
    }
}
