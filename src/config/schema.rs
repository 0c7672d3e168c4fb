use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// Contents of an `xfmt.toml` settings file.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Registered plugins to leave out of discovery
    #[serde(default)]
    pub disabled_plugins: Vec<String>,
    /// Collect dot-files and dot-directories too
    #[serde(default)]
    pub include_hidden: bool,
    /// Stop at the first file that fails
    #[serde(default)]
    pub fail_fast: bool,
    /// Exit non-zero when a check finds non-canonical files
    #[serde(default)]
    pub strict: bool,
    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for name in &self.disabled_plugins {
            if name.trim().is_empty() {
                issues.push(ValidationIssue::EmptyPluginName);
            } else if !seen.insert(name.as_str()) {
                issues.push(ValidationIssue::DuplicatePluginName(name.clone()));
            }
        }

        if let Some(path) = &self.log_file {
            if path.as_os_str().is_empty() {
                issues.push(ValidationIssue::EmptyLogFile);
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyPluginName,
    DuplicatePluginName(String),
    EmptyLogFile,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPluginName => {
                write!(f, "disabled_plugins contains an empty name")
            }
            ValidationIssue::DuplicatePluginName(name) => {
                write!(f, "plugin '{name}' is listed more than once in disabled_plugins")
            }
            ValidationIssue::EmptyLogFile => write!(f, "log_file must not be empty"),
        }
    }
}
