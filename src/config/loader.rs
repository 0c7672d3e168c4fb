use crate::config::schema::{Settings, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "xfmt.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read settings from {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse settings TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse settings TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid settings ({}): {}", path.display(), source),
                None => write!(f, "invalid settings: {}", source),
            },
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    settings
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(settings)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Load settings from an explicit file, else from `xfmt.toml` in `dir` if it
/// exists, else defaults.
pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Settings, ConfigError> {
    if let Some(path) = explicit {
        return load_from_path(path);
    }
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    if candidate.is_file() {
        return load_from_path(candidate);
    }
    Ok(Settings::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ValidationIssue;

    #[test]
    fn test_empty_input_is_default() {
        assert_eq!(load_from_str("").unwrap(), Settings::default());
    }

    #[test]
    fn test_full_settings() {
        let settings = load_from_str(
            r#"
disabled_plugins = ["toml"]
include_hidden = true
fail_fast = true
strict = true
log_file = "xfmt.log"
"#,
        )
        .unwrap();
        assert_eq!(settings.disabled_plugins, vec!["toml".to_string()]);
        assert!(settings.include_hidden);
        assert!(settings.fail_fast);
        assert!(settings.strict);
        assert_eq!(settings.log_file, Some(PathBuf::from("xfmt.log")));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = load_from_str("colour = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn test_validation_issues_are_collected() {
        let err = load_from_str(r#"disabled_plugins = ["", "json", "json"]"#).unwrap_err();
        match err {
            ConfigError::Validation { source, .. } => {
                assert_eq!(
                    source.issues,
                    vec![
                        ValidationIssue::EmptyPluginName,
                        ValidationIssue::DuplicatePluginName("json".to_string()),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_path_annotates_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("xfmt.toml");
        fs::write(&path, "strict = \"yes\"\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: Some(_), .. }));
        assert!(err.to_string().contains("xfmt.toml"));
    }

    #[test]
    fn test_resolve_prefers_explicit_then_default_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        assert_eq!(resolve(None, dir).unwrap(), Settings::default());

        fs::write(dir.join(DEFAULT_CONFIG_FILE), "strict = true\n").unwrap();
        assert!(resolve(None, dir).unwrap().strict);

        let other = dir.join("other.toml");
        fs::write(&other, "fail_fast = true\n").unwrap();
        let settings = resolve(Some(other.as_path()), dir).unwrap();
        assert!(settings.fail_fast);
        assert!(!settings.strict);

        let missing = dir.join("missing.toml");
        assert!(matches!(
            resolve(Some(missing.as_path()), dir),
            Err(ConfigError::Io { .. })
        ));
    }
}
