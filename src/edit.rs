use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Whole-file replacement with verification of the content it replaces.
///
/// Formatters rewrite entire files. The content read before canonicalization
/// is remembered so the write can be refused if the file changed in between.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Rewrite does nothing until apply() is called"]
pub struct Rewrite {
    /// Path to the file to rewrite
    pub file: PathBuf,
    /// Complete new content
    pub new_text: String,
    /// Verification of what we expect to find before applying
    pub expected_before: EditVerification,
}

/// Verification strategy for rewrite safety.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditVerification {
    /// Exact text match required
    ExactMatch(String),
    /// xxh3 hash of expected text (cheaper to hold for large files)
    Hash(u64),
}

impl EditVerification {
    /// Check if the provided text matches the verification criteria.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            EditVerification::ExactMatch(expected) => text == expected,
            EditVerification::Hash(expected_hash) => xxh3_64(text.as_bytes()) == *expected_hash,
        }
    }

    /// Create verification from text, using hash for text over 1KB.
    pub fn from_text(text: &str) -> Self {
        if text.len() > 1024 {
            EditVerification::Hash(xxh3_64(text.as_bytes()))
        } else {
            EditVerification::ExactMatch(text.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("{file} changed while it was being formatted")]
    ContentChanged { file: PathBuf },

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 validation error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result of applying a rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "EditResult should be checked for success/already-applied"]
pub enum EditResult {
    /// New content was written
    Applied { file: PathBuf, bytes_written: usize },
    /// File already held the new content
    AlreadyApplied { file: PathBuf },
}

impl Rewrite {
    pub fn new(file: impl Into<PathBuf>, before: &str, new_text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            new_text: new_text.into(),
            expected_before: EditVerification::from_text(before),
        }
    }

    /// Apply this rewrite atomically.
    ///
    /// Symlinks are resolved first so the link itself survives and its target
    /// is the file that gets replaced.
    pub fn apply(&self) -> Result<EditResult, EditError> {
        let target = self.file.canonicalize()?;
        let current = fs::read(&target)?;
        let current = std::str::from_utf8(&current)?;

        if current == self.new_text {
            return Ok(EditResult::AlreadyApplied {
                file: self.file.clone(),
            });
        }

        if !self.expected_before.matches(current) {
            return Err(EditError::ContentChanged {
                file: self.file.clone(),
            });
        }

        atomic_write(&target, self.new_text.as_bytes())?;

        Ok(EditResult::Applied {
            file: self.file.clone(),
            bytes_written: self.new_text.len(),
        })
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes. The temporary file is
/// removed on every error path when it is dropped.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), EditError> {
    // Same directory keeps the rename on one filesystem
    let parent = path.parent().ok_or_else(|| {
        EditError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Path has no parent directory",
        ))
    })?;
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().set_permissions(permissions)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
