//! Recursive file collection bounded by the collection root.
//!
//! [`collect`] walks a directory tree and lazily yields the regular files
//! below it as paths relative to the root. Every entry is resolved to its real
//! location first; anything that lands outside the root (typically through a
//! symlink) is pruned, and a directory that escapes is not descended into.

use crate::safety::{RootGuard, SafetyError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("collecting from a file is meaningless: {0}")]
    OperationMeaningless(PathBuf),

    #[error("path does not exist: {0}")]
    NotFound(PathBuf),

    #[error(transparent)]
    Boundary(#[from] SafetyError),

    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Knobs for [`collect`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectOptions {
    /// Also collect entries whose name starts with a dot.
    pub include_hidden: bool,
}

/// Collect file paths below `root`, relative to `root`.
///
/// Fails up front if `root` is missing or is not a directory. Errors met
/// during the walk are yielded as items so the caller can decide whether
/// to keep going.
pub fn collect(root: impl AsRef<Path>, options: CollectOptions) -> Result<Collected, CollectError> {
    let root = root.as_ref();
    if !root.is_dir() {
        if root.exists() {
            return Err(CollectError::OperationMeaningless(root.to_path_buf()));
        }
        return Err(CollectError::NotFound(root.to_path_buf()));
    }

    let guard = RootGuard::new(root)?;
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    Ok(Collected {
        root: root.to_path_buf(),
        guard,
        walker,
        include_hidden: options.include_hidden,
        seen: HashSet::new(),
    })
}

/// Lazy iterator returned by [`collect`].
pub struct Collected {
    root: PathBuf,
    guard: RootGuard,
    walker: walkdir::IntoIter,
    include_hidden: bool,
    /// Canonical paths already yielded
    seen: HashSet<PathBuf>,
}

impl Collected {
    /// Skip the current entry, pruning its subtree if it is a directory.
    fn prune(&mut self, entry: &DirEntry) {
        if entry.file_type().is_dir() {
            self.walker.skip_current_dir();
        }
    }
}

impl Iterator for Collected {
    type Item = Result<PathBuf, CollectError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    if let Some(ancestor) = err.loop_ancestor() {
                        warn!(
                            "Skipping symlink loop at {:?} (back to {})",
                            err.path(),
                            ancestor.display()
                        );
                        continue;
                    }
                    if err.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::NotFound) {
                        debug!("Skipping dangling entry {:?}", err.path());
                        continue;
                    }
                    return Some(Err(CollectError::Walk {
                        root: self.root.clone(),
                        source: err,
                    }));
                }
            };

            if entry.depth() > 0 && !self.include_hidden && is_hidden(&entry) {
                debug!("Skipping hidden entry {}", entry.path().display());
                self.prune(&entry);
                continue;
            }

            let canonical = match self.guard.resolve(entry.path()) {
                Ok(canonical) => canonical,
                Err(SafetyError::OutsideRoot { path, .. }) => {
                    warn!(
                        "Skipping {} which resolves outside the root to {}",
                        entry.path().display(),
                        path.display()
                    );
                    self.prune(&entry);
                    continue;
                }
                Err(err) => return Some(Err(err.into())),
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if !self.seen.insert(canonical) {
                debug!("Already collected {} via another path", entry.path().display());
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            return Some(Ok(relative.to_path_buf()));
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    // Byte check so names that are not UTF-8 are classified too
    entry.file_name().as_encoded_bytes().first() == Some(&b'.')
}
