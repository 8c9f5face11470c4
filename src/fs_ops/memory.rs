//! In-memory filesystem backend.
//!
//! Lets the planner, staged rename and merge logic run without touching disk.
//! Supports case-insensitive lookups (like default macOS/Windows volumes),
//! injected failures per operation and path, and a mutation counter so
//! tests can prove a dry run never tried to change anything.
//!
//! Rename follows POSIX rules: file over file replaces, directory over an
//! empty directory replaces, everything else fails.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use super::backend::{DirEntry, Filesystem, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug, Clone)]
struct Slot {
    /// Path with the casing it was created/renamed with.
    path: PathBuf,
    node: Node,
}

/// Operation an injected fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOp {
    /// `rename`/`move_file` whose source is the path.
    RenameFrom,
    /// `rename`/`move_file` whose destination is the path.
    RenameTo,
    RemoveFile,
    /// `remove_dir` (empty directories only).
    RemoveDir,
    /// `remove_dir_all`.
    RemoveTree,
    CreateDir,
    ReadDir,
}

#[derive(Debug, Clone)]
struct Fault {
    op: FaultOp,
    key: String,
    kind: io::ErrorKind,
}

#[derive(Debug)]
pub struct MemoryFs {
    case_insensitive: bool,
    slots: RefCell<BTreeMap<String, Slot>>,
    faults: RefCell<Vec<Fault>>,
    mutations: Cell<usize>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    /// Empty case-sensitive filesystem containing only "/".
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Empty filesystem where names differing only in case are the same entry.
    pub fn case_insensitive() -> Self {
        Self::build(true)
    }

    fn build(case_insensitive: bool) -> Self {
        let fs = Self {
            case_insensitive,
            slots: RefCell::new(BTreeMap::new()),
            faults: RefCell::new(Vec::new()),
            mutations: Cell::new(0),
        };
        fs.slots.borrow_mut().insert(
            "/".to_string(),
            Slot {
                path: PathBuf::from("/"),
                node: Node::Dir,
            },
        );
        fs
    }

    /// Create a directory and any missing parents (test setup, not counted).
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        self.ensure_dirs(path.as_ref());
        self
    }

    /// Create or overwrite a file, creating parents (test setup, not counted).
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> &Self {
        let path = path.as_ref();
        let parent = path.parent().unwrap_or_else(|| Path::new("/"));
        let parent_actual = self.ensure_dirs(parent);
        let name = path.file_name().map(PathBuf::from).unwrap_or_default();
        self.slots.borrow_mut().insert(
            self.key(path),
            Slot {
                path: parent_actual.join(name),
                node: Node::File(contents.as_ref().to_vec()),
            },
        );
        self
    }

    /// Make every future `op` on `path` fail with `kind`.
    pub fn fail(&self, op: FaultOp, path: impl AsRef<Path>, kind: io::ErrorKind) -> &Self {
        self.faults.borrow_mut().push(Fault {
            op,
            key: self.key(path.as_ref()),
            kind,
        });
        self
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) {
        self.faults.borrow_mut().clear();
    }

    /// Number of mutating calls attempted so far (successful or not).
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }

    /// File contents, `None` if absent or a directory.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.slots.borrow().get(&self.key(path.as_ref())) {
            Some(Slot {
                node: Node::File(data),
                ..
            }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Sorted child names of a directory, with their stored casing.
    pub fn names_in(&self, path: impl AsRef<Path>) -> Vec<String> {
        let mut names: Vec<String> = self
            .read_dir(path.as_ref())
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.name.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Every entry as (path, contents) where directories carry `None`,
    /// sorted by path. Two snapshots compare equal iff the trees match.
    pub fn snapshot(&self) -> Vec<(PathBuf, Option<Vec<u8>>)> {
        let mut out: Vec<_> = self
            .slots
            .borrow()
            .values()
            .map(|slot| {
                let data = match &slot.node {
                    Node::File(d) => Some(d.clone()),
                    Node::Dir => None,
                };
                (slot.path.clone(), data)
            })
            .collect();
        out.sort();
        out
    }

    fn key(&self, path: &Path) -> String {
        let raw = path.to_string_lossy().replace('\\', "/");
        let trimmed = if raw.len() > 1 {
            raw.trim_end_matches('/').to_string()
        } else {
            raw
        };
        if self.case_insensitive {
            trimmed.to_lowercase()
        } else {
            trimmed
        }
    }

    fn within(key: &str, base: &str) -> bool {
        key == base || key.starts_with(&format!("{}/", base.trim_end_matches('/')))
    }

    fn ensure_dirs(&self, path: &Path) -> PathBuf {
        let key = self.key(path);
        if let Some(slot) = self.slots.borrow().get(&key) {
            return slot.path.clone();
        }
        let parent_actual = match path.parent() {
            Some(parent) => self.ensure_dirs(parent),
            None => PathBuf::from("/"),
        };
        let actual = match path.file_name() {
            Some(name) => parent_actual.join(name),
            None => parent_actual,
        };
        self.slots.borrow_mut().insert(
            key,
            Slot {
                path: actual.clone(),
                node: Node::Dir,
            },
        );
        actual
    }

    fn check_fault(&self, op: FaultOp, path: &Path) -> io::Result<()> {
        let key = self.key(path);
        match self.faults.borrow().iter().find(|f| f.op == op && f.key == key) {
            Some(f) => Err(io::Error::new(
                f.kind,
                format!("injected {:?} failure on {}", op, path.display()),
            )),
            None => Ok(()),
        }
    }

    fn node_of(&self, path: &Path) -> Option<Node> {
        self.slots
            .borrow()
            .get(&self.key(path))
            .map(|s| s.node.clone())
    }

    fn actual_path(&self, path: &Path) -> Option<PathBuf> {
        self.slots.borrow().get(&self.key(path)).map(|s| s.path.clone())
    }

    fn require_parent_dir(&self, path: &Path) -> io::Result<PathBuf> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
        match self.slots.borrow().get(&self.key(parent)) {
            Some(Slot {
                node: Node::Dir,
                path,
            }) => Ok(path.clone()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("parent of {} is not a directory", path.display()),
            )),
            None => Err(not_found(parent)),
        }
    }

    fn has_children(&self, path: &Path) -> bool {
        let key = self.key(path);
        self.slots
            .borrow()
            .keys()
            .any(|k| k != &key && Self::within(k, &key))
    }

    fn remove_subtree(&self, path: &Path) {
        let key = self.key(path);
        self.slots
            .borrow_mut()
            .retain(|k, _| !Self::within(k, &key));
    }

    fn bump(&self) {
        self.mutations.set(self.mutations.get() + 1);
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl Filesystem for MemoryFs {
    fn kind(&self, path: &Path) -> io::Result<Option<NodeKind>> {
        Ok(self.node_of(path).map(|n| match n {
            Node::File(_) => NodeKind::File,
            Node::Dir => NodeKind::Directory,
        }))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        self.check_fault(FaultOp::ReadDir, path)?;
        match self.node_of(path) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", path.display()),
                ));
            }
            None => return Err(not_found(path)),
        }
        let key = self.key(path);
        let slots = self.slots.borrow();
        let entries = slots
            .iter()
            .filter(|(k, slot)| {
                k.as_str() != key
                    && slot
                        .path
                        .parent()
                        .is_some_and(|p| self.key(p) == key)
            })
            .filter_map(|(_, slot)| {
                let name = slot.path.file_name()?.to_os_string();
                let kind = match slot.node {
                    Node::File(_) => NodeKind::File,
                    Node::Dir => NodeKind::Directory,
                };
                Some(DirEntry::new(name, kind))
            })
            .collect();
        Ok(entries)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.bump();
        self.check_fault(FaultOp::RenameFrom, from)?;
        self.check_fault(FaultOp::RenameTo, to)?;

        let from_node = self.node_of(from).ok_or_else(|| not_found(from))?;
        let from_actual = self.actual_path(from).ok_or_else(|| not_found(from))?;
        let to_parent = self.require_parent_dir(to)?;
        let from_key = self.key(from);
        let to_key = self.key(to);

        if from_key != to_key {
            if Self::within(&to_key, &from_key) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "cannot move a directory into itself",
                ));
            }
            match (&from_node, self.node_of(to)) {
                (_, None) => {}
                (Node::File(_), Some(Node::File(_))) => self.remove_subtree(to),
                (Node::Dir, Some(Node::Dir)) if !self.has_children(to) => self.remove_subtree(to),
                (Node::Dir, Some(Node::Dir)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::DirectoryNotEmpty,
                        format!("directory not empty: {}", to.display()),
                    ));
                }
                (Node::Dir, Some(Node::File(_))) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("not a directory: {}", to.display()),
                    ));
                }
                (Node::File(_), Some(Node::Dir)) => {
                    return Err(io::Error::new(
                        io::ErrorKind::IsADirectory,
                        format!("is a directory: {}", to.display()),
                    ));
                }
            }
        }

        let new_root = match to.file_name() {
            Some(name) => to_parent.join(name),
            None => return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty target name")),
        };

        let mut slots = self.slots.borrow_mut();
        let moved: Vec<String> = slots
            .keys()
            .filter(|k| Self::within(k, &from_key))
            .cloned()
            .collect();
        let mut reinserted = Vec::with_capacity(moved.len());
        for k in moved {
            if let Some(slot) = slots.remove(&k) {
                let rel = slot
                    .path
                    .strip_prefix(&from_actual)
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                let path = if rel.as_os_str().is_empty() {
                    new_root.clone()
                } else {
                    new_root.join(rel)
                };
                reinserted.push(Slot {
                    path,
                    node: slot.node,
                });
            }
        }
        for slot in reinserted {
            let key = self.key(&slot.path);
            slots.insert(key, slot);
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.bump();
        self.check_fault(FaultOp::RemoveFile, path)?;
        match self.node_of(path) {
            Some(Node::File(_)) => {
                self.remove_subtree(path);
                Ok(())
            }
            Some(Node::Dir) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.bump();
        self.check_fault(FaultOp::RemoveDir, path)?;
        match self.node_of(path) {
            Some(Node::Dir) if self.has_children(path) => Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("directory not empty: {}", path.display()),
            )),
            Some(Node::Dir) => {
                self.remove_subtree(path);
                Ok(())
            }
            Some(Node::File(_)) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.bump();
        self.check_fault(FaultOp::RemoveTree, path)?;
        match self.node_of(path) {
            Some(Node::Dir) => {
                self.remove_subtree(path);
                Ok(())
            }
            Some(Node::File(_)) => Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("not a directory: {}", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.bump();
        self.check_fault(FaultOp::CreateDir, path)?;
        let parent_actual = self.require_parent_dir(path)?;
        if self.node_of(path).is_some() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("already exists: {}", path.display()),
            ));
        }
        let name = path
            .file_name()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty directory name"))?;
        self.slots.borrow_mut().insert(
            self.key(path),
            Slot {
                path: parent_actual.join(name),
                node: Node::Dir,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_and_listing() {
        let fs = MemoryFs::new();
        fs.add_file("/r/a.txt", "a").add_dir("/r/sub/deep");
        assert_eq!(fs.names_in("/r"), vec!["a.txt", "sub"]);
        assert_eq!(fs.kind(Path::new("/r/sub/deep")).unwrap(), Some(NodeKind::Directory));
        assert_eq!(fs.read("/r/a.txt").unwrap(), b"a");
        assert_eq!(fs.mutations(), 0);
    }

    #[test]
    fn rename_moves_whole_subtree() {
        let fs = MemoryFs::new();
        fs.add_file("/r/d/x/y.txt", "y");
        fs.rename(Path::new("/r/d"), Path::new("/r/e")).unwrap();
        assert!(!fs.exists(Path::new("/r/d")));
        assert_eq!(fs.read("/r/e/x/y.txt").unwrap(), b"y");
        assert_eq!(fs.mutations(), 1);
    }

    #[test]
    fn rename_follows_posix_collision_rules() {
        let fs = MemoryFs::new();
        fs.add_file("/r/a", "1").add_file("/r/b", "2").add_dir("/r/empty");
        fs.add_file("/r/full/x", "x");

        fs.rename(Path::new("/r/a"), Path::new("/r/b")).unwrap();
        assert_eq!(fs.read("/r/b").unwrap(), b"1");

        let err = fs.rename(Path::new("/r/b"), Path::new("/r/empty")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);

        fs.add_dir("/r/d1");
        fs.rename(Path::new("/r/d1"), Path::new("/r/empty")).unwrap();
        fs.add_dir("/r/d2");
        let err = fs.rename(Path::new("/r/d2"), Path::new("/r/full")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::DirectoryNotEmpty);
    }

    #[test]
    fn case_insensitive_lookup_and_case_only_rename() {
        let fs = MemoryFs::case_insensitive();
        fs.add_file("/r/photo.JPG", "p");
        assert!(fs.exists(Path::new("/r/PHOTO.jpg")));
        fs.rename(Path::new("/r/photo.JPG"), Path::new("/r/Photo.JPG")).unwrap();
        assert_eq!(fs.names_in("/r"), vec!["Photo.JPG"]);
    }

    #[test]
    fn injected_fault_fires_and_counts_attempt() {
        let fs = MemoryFs::new();
        fs.add_file("/r/a", "1");
        fs.fail(FaultOp::RenameTo, "/r/b", io::ErrorKind::PermissionDenied);
        let err = fs.rename(Path::new("/r/a"), Path::new("/r/b")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(fs.exists(Path::new("/r/a")));
        assert_eq!(fs.mutations(), 1);

        fs.clear_faults();
        fs.rename(Path::new("/r/a"), Path::new("/r/b")).unwrap();
    }

    #[test]
    fn remove_dir_requires_empty() {
        let fs = MemoryFs::new();
        fs.add_file("/r/d/x", "x");
        assert_eq!(
            fs.remove_dir(Path::new("/r/d")).unwrap_err().kind(),
            io::ErrorKind::DirectoryNotEmpty
        );
        fs.remove_dir_all(Path::new("/r/d")).unwrap();
        assert_eq!(fs.names_in("/r"), Vec::<String>::new());
    }

    #[test]
    fn snapshot_reflects_structure() {
        let a = MemoryFs::new();
        a.add_file("/r/x", "1").add_dir("/r/y");
        let b = MemoryFs::new();
        b.add_dir("/r/y").add_file("/r/x", "1");
        assert_eq!(a.snapshot(), b.snapshot());
        b.add_file("/r/x", "2");
        assert_ne!(a.snapshot(), b.snapshot());
    }
}
