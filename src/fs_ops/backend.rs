//! Filesystem abstraction used by the rename engine.
//!
//! The engine only needs "inspect / list children / rename / delete / mkdir",
//! so those calls sit behind the `Filesystem` trait. `RealFs` maps them onto
//! `std::fs`; `MemoryFs` (see `memory.rs`) keeps a tree in memory for tests.
//!
//! Backends return plain `io::Result`; callers attach op/path context.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use super::helpers::is_cross_device;

/// What a path currently is. Anything that is not a directory (regular
/// file, symlink, fifo, ...) is a leaf and reported as `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    pub fn is_dir(self) -> bool {
        self == NodeKind::Directory
    }

    /// Upper-case label used in report lines.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::File => "FILE",
            NodeKind::Directory => "FOLDER",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: OsString,
    /// Kind of the entry itself; a symlink is always `File`.
    pub kind: NodeKind,
    /// Symlink whose target is a directory. Named like a folder, walked like a file.
    pub link_to_dir: bool,
}

impl DirEntry {
    pub fn new(name: impl Into<OsString>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            link_to_dir: false,
        }
    }

    /// Kind whose naming rule applies to this entry.
    pub fn naming_kind(&self) -> NodeKind {
        if self.link_to_dir {
            NodeKind::Directory
        } else {
            self.kind
        }
    }
}

pub trait Filesystem {
    /// Kind of `path` without following symlinks; `None` when absent.
    fn kind(&self, path: &Path) -> io::Result<Option<NodeKind>>;

    /// Kind of `path` following symlinks; `None` when absent or dangling.
    fn resolve_kind(&self, path: &Path) -> io::Result<Option<NodeKind>> {
        self.kind(path)
    }

    /// Immediate children of the directory at `path`, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Rename within the same filesystem. Callers clear the destination first.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Move a single file; backends may fall back to copy+delete.
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn create_dir(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool {
        matches!(self.kind(path), Ok(Some(_)))
    }
}

impl<T: Filesystem + ?Sized> Filesystem for &T {
    fn kind(&self, path: &Path) -> io::Result<Option<NodeKind>> {
        (**self).kind(path)
    }
    fn resolve_kind(&self, path: &Path) -> io::Result<Option<NodeKind>> {
        (**self).resolve_kind(path)
    }
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        (**self).read_dir(path)
    }
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }
    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).move_file(from, to)
    }
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        (**self).remove_file(path)
    }
    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir(path)
    }
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        (**self).remove_dir_all(path)
    }
    fn create_dir(&self, path: &Path) -> io::Result<()> {
        (**self).create_dir(path)
    }
}

/// The host filesystem via `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl Filesystem for RealFs {
    fn kind(&self, path: &Path) -> io::Result<Option<NodeKind>> {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_dir() => Ok(Some(NodeKind::Directory)),
            Ok(_) => Ok(Some(NodeKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn resolve_kind(&self, path: &Path) -> io::Result<Option<NodeKind>> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(Some(NodeKind::Directory)),
            Ok(_) => Ok(Some(NodeKind::File)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            // DirEntry::file_type does not follow symlinks.
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                NodeKind::Directory
            } else {
                NodeKind::File
            };
            let link_to_dir = file_type.is_symlink()
                && fs::metadata(entry.path()).is_ok_and(|m| m.is_dir());
            out.push(DirEntry {
                name: entry.file_name(),
                kind,
                link_to_dir,
            });
        }
        Ok(out)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        debug!(from = %from.display(), to = %to.display(), "rename");
        fs::rename(from, to)?;
        if let Some(parent) = to.parent() {
            sync_parent(parent);
        }
        Ok(())
    }

    fn move_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        match self.rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if is_cross_device(&e) => {
                warn!(from = %from.display(), to = %to.display(), "cross-device move; copying instead");
                copy_preserving_times(from, to)?;
                fs::remove_file(from)
            }
            Err(e) => Err(e),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        debug!(path = %path.display(), "remove file");
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        debug!(path = %path.display(), "remove empty directory");
        fs::remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        debug!(path = %path.display(), "remove directory tree");
        fs::remove_dir_all(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        debug!(path = %path.display(), "create directory");
        fs::create_dir(path)
    }
}

/// Persist a directory entry change. Failure does not undo the rename.
fn sync_parent(dir: &Path) {
    if let Err(e) = crate::platform::fsync_dir(dir) {
        warn!(dir = %dir.display(), error = %e, "could not sync directory after rename");
    }
}

/// Copy `from` to `to` keeping permissions and access/modification times.
/// On failure the partial destination is removed.
fn copy_preserving_times(from: &Path, to: &Path) -> io::Result<()> {
    let meta = fs::metadata(from)?;
    let result = fs::copy(from, to).and_then(|_| {
        let atime = filetime::FileTime::from_last_access_time(&meta);
        let mtime = filetime::FileTime::from_last_modification_time(&meta);
        filetime::set_file_times(to, atime, mtime)
    });
    if result.is_err() {
        let _ = fs::remove_file(to);
    }
    result
}
