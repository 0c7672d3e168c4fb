use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boundary check that keeps collected paths inside a collection root.
///
/// Paths are compared by their real location on disk, so a symlink inside the
/// root that points elsewhere is rejected.
#[derive(Debug, Clone)]
pub struct RootGuard {
    /// Canonical path to the collection root
    root: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path resolves outside collection root: {path} (root: {root})")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to canonicalize {path}: {source}")]
    Canonicalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RootGuard {
    /// Create a guard for the given root.
    ///
    /// The root is canonicalized so that a root reached through a symlink is
    /// compared by its real location.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, SafetyError> {
        let root = canonicalize(root.as_ref())?;
        Ok(Self { root })
    }

    /// Resolve `path` and check that it lies inside the root.
    ///
    /// Relative paths are taken relative to the root. Returns the canonical
    /// path on success.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let canonical = canonicalize(&absolute)?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.root) {
            return Err(SafetyError::OutsideRoot {
                path: canonical.to_path_buf(),
                root: self.root.clone(),
            });
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn canonicalize(path: &Path) -> Result<PathBuf, SafetyError> {
    path.canonicalize()
        .map_err(|source| SafetyError::Canonicalize {
            path: path.to_path_buf(),
            source,
        })
}
