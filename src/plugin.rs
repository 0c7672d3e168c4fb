//! Plugin capability traits.
//!
//! A plugin claims files by path and reports how their content differs from
//! its canonical form. Two generations exist side by side:
//!
//! - [`Checker`]: read-only, can only report.
//! - [`Formatter`]: a checker that can also rewrite the file in place.
//!
//! [`Plugin`] holds either one so the dispatcher can treat them uniformly and
//! fall back to checking when a fix is requested from a checker.

use crate::diff::{diff, FeedbackChunk};
use crate::edit::{EditError, EditResult, Rewrite};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("malformed content in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: MalformedContent,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rewrite {path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: EditError,
    },

    #[error("plugin could not be initialized: {0}")]
    Init(String),
}

/// The content of a file cannot be parsed by a canonicalizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MalformedContent {
    pub message: String,
}

impl MalformedContent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Read-only plugin.
pub trait Checker {
    /// Registration name, used in logs.
    fn name(&self) -> &str;

    /// Whether this plugin handles `path`. Must not touch the filesystem.
    fn matches(&self, path: &Path) -> bool;

    /// Report how the file differs from its canonical form.
    ///
    /// An empty result means the file already conforms.
    fn check(&self, path: &Path) -> Result<Vec<FeedbackChunk>, PluginError>;
}

/// Plugin that can also bring a file into its canonical form.
pub trait Formatter: Checker {
    /// Rewrite the file in place if needed and report what changed.
    ///
    /// Running `fix` twice in a row must yield empty feedback the second time.
    fn fix(&self, path: &Path) -> Result<Vec<FeedbackChunk>, PluginError>;
}

/// A discovered plugin of either generation.
pub enum Plugin {
    Checker(Box<dyn Checker>),
    Formatter(Box<dyn Formatter>),
}

impl Plugin {
    pub fn name(&self) -> &str {
        match self {
            Plugin::Checker(checker) => checker.name(),
            Plugin::Formatter(formatter) => formatter.name(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Plugin::Checker(checker) => checker.matches(path),
            Plugin::Formatter(formatter) => formatter.matches(path),
        }
    }

    pub fn check(&self, path: &Path) -> Result<Vec<FeedbackChunk>, PluginError> {
        match self {
            Plugin::Checker(checker) => checker.check(path),
            Plugin::Formatter(formatter) => formatter.check(path),
        }
    }

    /// Fix the file, or `None` when the plugin is check-only.
    pub fn fix(&self, path: &Path) -> Option<Result<Vec<FeedbackChunk>, PluginError>> {
        match self {
            Plugin::Checker(_) => None,
            Plugin::Formatter(formatter) => Some(formatter.fix(path)),
        }
    }

    pub fn can_fix(&self) -> bool {
        matches!(self, Plugin::Formatter(_))
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.can_fix() { "Formatter" } else { "Checker" };
        f.debug_struct(kind).field("name", &self.name()).finish()
    }
}

/// Turns content into its canonical form.
pub type Canonicalizer = fn(&str) -> Result<String, MalformedContent>;

/// Plugin driven by a [`Canonicalizer`] and matched by file extension.
///
/// Implements both traits; wrapping it in [`Plugin::Checker`] yields a
/// read-only plugin.
#[derive(Debug, Clone)]
pub struct TextPlugin {
    name: String,
    extensions: Vec<String>,
    canonicalize: Canonicalizer,
}

impl TextPlugin {
    pub fn new(name: impl Into<String>, extensions: &[&str], canonicalize: Canonicalizer) -> Self {
        Self {
            name: name.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
            canonicalize,
        }
    }

    /// Read the file and compute its canonical form.
    fn load(&self, path: &Path) -> Result<(String, String), PluginError> {
        let before = fs::read_to_string(path).map_err(|source| PluginError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let after = (self.canonicalize)(&before).map_err(|source| PluginError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok((before, after))
    }
}

impl Checker for TextPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }

    fn check(&self, path: &Path) -> Result<Vec<FeedbackChunk>, PluginError> {
        let (before, after) = self.load(path)?;
        let label = path.display().to_string();
        Ok(diff(&before, &after, Some(&label)))
    }
}

impl Formatter for TextPlugin {
    fn fix(&self, path: &Path) -> Result<Vec<FeedbackChunk>, PluginError> {
        let (before, after) = self.load(path)?;
        let label = path.display().to_string();
        let feedback = diff(&before, &after, Some(&label));
        if feedback.is_empty() {
            return Ok(feedback);
        }

        let rewrite = Rewrite::new(path, &before, after);
        match rewrite.apply() {
            Ok(EditResult::Applied { bytes_written, .. }) => {
                debug!("{}: wrote {} bytes to {}", self.name, bytes_written, label);
            }
            Ok(EditResult::AlreadyApplied { .. }) => {
                debug!("{}: {} was already canonical on disk", self.name, label);
            }
            Err(source) => {
                return Err(PluginError::Edit {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
        Ok(feedback)
    }
}
