//! Core library for `tree_rename`.
//!
//! Recursively renames every file and folder under a root, bottom-up:
//! folders become ALL CAPS, files get a capitalised first character with the
//! rest lowercased, and trailing " (n)" counters are removed. Name collisions
//! are resolved by overwriting (files) or merging (folders), and every rename
//! goes through a temporary sibling name so a failure can be rolled back.
//!
//! The walk is split into a pure planner (`plan`) and an executor
//! (`engine`) that runs over any `Filesystem`, so the whole algorithm can be
//! exercised against the in-memory `MemoryFs` as well as the real disk.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs_ops;
pub mod naming;
pub mod output;
pub mod plan;
pub mod platform;
pub mod shutdown;
pub mod sink;

pub use config::{Config, LogLevel, default_config_path, load_config, load_config_from_xml_path, path_has_symlink_ancestor};
pub use engine::{Engine, RunSummary, rename_tree};
pub use errors::{RenameError, Result};
pub use fs_ops::{Filesystem, MemoryFs, NodeKind, RealFs, StageOutcome};
pub use naming::{file_name_rule, folder_name_rule};
pub use plan::{Plan, RenameIntent, Step, plan_tree};
pub use sink::{BufferSink, LogSink, StdoutSink, TeeSink, TracingSink};
