//! Routing one file to the plugins that claim it.

use crate::diff::FeedbackChunk;
use crate::plugin::{Plugin, PluginError};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Whether files are only checked or also rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Check,
    Fix,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Check => f.write_str("check"),
            Mode::Fix => f.write_str("fix"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    /// No plugin claims the path.
    #[error("path did not match any plugin: {0}")]
    Unmatched(PathBuf),

    #[error("plugin '{plugin}' failed: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: PluginError,
    },
}

impl DispatchError {
    pub fn is_unmatched(&self) -> bool {
        matches!(self, DispatchError::Unmatched(_))
    }
}

/// Run every plugin that matches `path` and concatenate their feedback.
///
/// Several plugins may claim the same file; their feedback is additive, in
/// plugin order. In fix mode a check-only plugin is run as a check.
pub fn dispatch(
    path: &Path,
    plugins: &[Plugin],
    mode: Mode,
) -> Result<Vec<FeedbackChunk>, DispatchError> {
    let mut matched = false;
    let mut feedback = Vec::new();

    for plugin in plugins.iter().filter(|plugin| plugin.matches(path)) {
        matched = true;
        debug!("{} matched by {}", path.display(), plugin.name());

        let result = match mode {
            Mode::Check => plugin.check(path),
            Mode::Fix => match plugin.fix(path) {
                Some(result) => result,
                None => {
                    info!(
                        "{} is check-only, not fixing {}",
                        plugin.name(),
                        path.display()
                    );
                    plugin.check(path)
                }
            },
        };

        let chunks = result.map_err(|source| DispatchError::Plugin {
            plugin: plugin.name().to_string(),
            source,
        })?;
        feedback.extend(chunks);
    }

    if !matched {
        return Err(DispatchError::Unmatched(path.to_path_buf()));
    }
    Ok(feedback)
}
