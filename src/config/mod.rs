//! Config module.
//! Provides configuration types, the config file location, and XML loading.
//! Precedence is CLI flags > XML file > built-in defaults; the CLI layer
//! applies its overrides on top of what is loaded here.

pub mod paths;
pub mod types;
pub mod xml;

pub use paths::{CONFIG_ENV, default_config_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path};
