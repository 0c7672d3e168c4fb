//! Plugins shipped with the engine.
//!
//! - [`json`]: formatter enforcing the canonical JSON layout.
//! - [`toml`]: checker that only verifies TOML syntax.

pub mod json;
pub mod toml;

use crate::plugin::{Plugin, PluginError, TextPlugin};

/// Factory for the JSON formatter.
pub fn json_formatter() -> Result<Plugin, PluginError> {
    Ok(Plugin::Formatter(Box::new(TextPlugin::new(
        json::NAME,
        json::EXTENSIONS,
        json::canonicalize,
    ))))
}

/// Factory for the TOML checker.
pub fn toml_checker() -> Result<Plugin, PluginError> {
    Ok(Plugin::Checker(Box::new(TextPlugin::new(
        toml::NAME,
        toml::EXTENSIONS,
        toml::canonicalize,
    ))))
}
