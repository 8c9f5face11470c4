//! Filesystem operations used by the rename engine.
//! Backend abstraction, removal, directory merge and the staged rename.

pub mod backend;
pub mod helpers;
pub mod memory;
mod merge;
mod remove;
mod staged;

pub use backend::{DirEntry, Filesystem, NodeKind, RealFs};
pub use helpers::io_error_with_help;
pub use memory::{FaultOp, MemoryFs};
pub use merge::merge_dirs;
pub use remove::remove_path;
pub use staged::{Rollback, StageOutcome, TEMP_PREFIX, staged_rename, temp_sibling};
