//! Typed error definitions for tree_rename.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::fs_ops::helpers::build_message;

pub type Result<T, E = RenameError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RenameError {
    /// The root handed to the walker does not exist. The only fatal failure.
    #[error("Path not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// A single filesystem call failed; message carries an OS-specific hint.
    #[error("{}", build_message(.op, .path, .source))]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("rollback '{}' -> '{}' failed: {source}", .tmp.display(), .src.display())]
    RollbackFailed {
        src: PathBuf,
        tmp: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl RenameError {
    /// Stable numeric code, used as `code` field in structured logs.
    pub fn code(&self) -> u8 {
        match self {
            RenameError::RootNotFound(_) => 2,
            RenameError::Io { .. } => 3,
            RenameError::RollbackFailed { .. } => 4,
            RenameError::Interrupted => 130,
        }
    }

    /// Short machine-friendly kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            RenameError::RootNotFound(_) => "root_not_found",
            RenameError::Io { .. } => "io",
            RenameError::RollbackFailed { .. } => "rollback_failed",
            RenameError::Interrupted => "interrupted",
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        match self {
            RenameError::Io { source, .. } | RenameError::RollbackFailed { source, .. } => {
                source.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn root_not_found_message_names_path() {
        let err = RenameError::RootNotFound(PathBuf::from("/nope/here"));
        assert_eq!(err.to_string(), "Path not found: /nope/here");
        assert_eq!(err.code(), 2);
        assert_eq!(err.kind(), "root_not_found");
    }

    #[test]
    fn io_variant_reports_permission_denied() {
        let err = RenameError::Io {
            op: "rename",
            path: Path::new("/tmp/x").to_path_buf(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.is_permission_denied());
        let msg = err.to_string();
        assert!(msg.starts_with("rename '/tmp/x'"), "msg was: {msg}");
        assert!(msg.contains("permission denied"), "msg was: {msg}");
    }
}
