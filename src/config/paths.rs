//! Config file location and symlink checks.

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "TREE_RENAME_CONFIG";

const APP_DIR: &str = "tree_rename";
const CONFIG_FILE: &str = "config.xml";

/// Where the config file is looked up.
///
/// `$TREE_RENAME_CONFIG` wins when set: relative values resolve against the
/// current directory, and a directory value (existing, or written with a
/// trailing separator) means `<dir>/config.xml`. Otherwise the platform config
/// dir is used, falling back to `$HOME/.config`.
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(raw) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        let looks_like_dir = raw
            .to_str()
            .is_some_and(|s| s.ends_with('/') || s.ends_with('\\'));
        let mut path = PathBuf::from(raw);
        if path.is_relative() {
            path = env::current_dir()
                .context("resolve current directory for relative config path")?
                .join(path);
        }
        if looks_like_dir || path.is_dir() {
            path.push(CONFIG_FILE);
        }
        return Ok(path);
    }

    if let Some(mut base) = config_dir() {
        base.push(APP_DIR);
        base.push(CONFIG_FILE);
        return Ok(base);
    }
    env::var_os("HOME")
        .map(|h| PathBuf::from(h).join(".config").join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| anyhow!("cannot determine a config directory (no config dir and HOME unset)"))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}
