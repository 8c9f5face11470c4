//! XML configuration support.
//!
//! Reads `config.xml` with quick_xml + serde:
//!
//! ```xml
//! <config>
//!   <log_level>normal</log_level>
//!   <log_file>/var/log/tree_rename.log</log_file>
//!   <json>false</json>
//! </config>
//! ```
//!
//! Every element is optional. Unknown elements, malformed XML and invalid
//! values are hard errors so misconfigurations surface early. A missing file
//! is not an error.

use anyhow::{Context, Result, bail};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::default_config_path;
use super::types::{Config, LogLevel};

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    #[serde(rename = "log_level")]
    log_level: Option<String>,
    #[serde(rename = "log_file")]
    log_file: Option<String>,
    #[serde(rename = "json", default, deserialize_with = "de_bool_trimmed_opt")]
    json: Option<bool>,
}

// Tolerates surrounding whitespace inside <json> </json>.
fn de_bool_trimmed_opt<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            other => Err(D::Error::custom(format!("invalid boolean for <json>: '{other}'"))),
        },
    }
}

// Map XmlConfig -> Config, keeping defaults for anything not set.
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = parsed.log_level.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            match LogLevel::parse(trimmed) {
                Some(level) => cfg.log_level = level,
                None => bail!("invalid <log_level> '{trimmed}' (expected quiet, normal, info or debug)"),
            }
        }
    }
    if let Some(s) = parsed.log_file.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            cfg.log_file = Some(PathBuf::from(trimmed));
        }
    }
    if let Some(json) = parsed.json {
        cfg.json = json;
    }

    Ok(cfg)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("invalid config xml '{}'", path.display()))
}

/// Load the config file from its usual location.
/// Returns `Ok(None)` when there is no file there.
pub fn load_config() -> Result<Option<Config>> {
    let path = default_config_path().context("resolve config path")?;
    if !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(None);
    }
    debug!(path = %path.display(), "loading config file");
    load_config_from_xml_path(&path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(xml: &str) -> (tempfile::TempDir, PathBuf) {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("config.xml");
        fs::write(&path, xml).unwrap();
        (td, path)
    }

    #[test]
    fn reads_all_fields() {
        let (_td, path) = write(
            "<config>\n  <log_level>debug</log_level>\n  <log_file>/tmp/tr.log</log_file>\n  <json> true </json>\n</config>",
        );
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert_eq!(cfg.log_file, Some(PathBuf::from("/tmp/tr.log")));
        assert!(cfg.json);
        assert!(cfg.dry_run);
    }

    #[test]
    fn empty_elements_keep_defaults() {
        let (_td, path) = write("<config><log_level>  </log_level><log_file></log_file></config>");
        let cfg = load_config_from_xml_path(&path).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let (_td, path) = write("<config><download_base>/x</download_base></config>");
        let err = load_config_from_xml_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse config xml"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let (_td, path) = write("<config>\n  <log_level>info\n</config>");
        let err = load_config_from_xml_path(&path).unwrap_err();
        assert!(format!("{err}").contains("parse config xml"));
    }

    #[test]
    fn invalid_level_is_an_error() {
        let (_td, path) = write("<config><log_level>loud</log_level></config>");
        let err = load_config_from_xml_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid <log_level> 'loud'"));
    }
}
