//! Unified diff computation and chunking.
//!
//! Feedback is always expressed as a unified diff between the current content
//! of a file and its canonical form. The diff is split into [`FeedbackChunk`]s,
//! one per `--- <label>` header, so callers can render or drop each logical
//! unit on its own.

use similar::{ChangeTag, TextDiff};
use std::fmt;
use thiserror::Error;

/// "From" header used when the diffed content has no file identity.
pub const ACTUAL_LABEL: &str = "actual";
/// "To" header used when the diffed content has no file identity.
pub const EXPECTED_LABEL: &str = "expected";

const CONTEXT_RADIUS: usize = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// A feedback line does not fit the unified diff grammar.
    #[error("unrecognized diff format: {line:?}")]
    ProtocolViolation { line: String },
}

/// One self-contained segment of unified diff output.
///
/// Every line keeps its terminating newline, so `to_string()` yields the exact
/// text of the segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackChunk {
    lines: Vec<String>,
}

impl FeedbackChunk {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Classify each line of the chunk for display.
    pub fn classified(&self) -> impl Iterator<Item = Result<(LineKind, &str), DiffError>> + '_ {
        self.lines.iter().map(|line| {
            let text = line.strip_suffix('\n').unwrap_or(line);
            classify_line(text).map(|kind| (kind, text))
        })
    }
}

impl fmt::Display for FeedbackChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Display class of a single diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Header,
    Range,
    Addition,
    Removal,
}

/// Classify one diff line (with or without its trailing newline).
///
/// Order matters: `---`/`+++` must be tested before the single-character
/// prefixes.
pub fn classify_line(line: &str) -> Result<LineKind, DiffError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let kind = if line.is_empty() || line.starts_with(' ') {
        LineKind::Context
    } else if line.starts_with("---") || line.starts_with("+++") {
        LineKind::Header
    } else if line.starts_with("@@") {
        LineKind::Range
    } else if line.starts_with('+') {
        LineKind::Addition
    } else if line.starts_with('-') {
        LineKind::Removal
    } else {
        return Err(DiffError::ProtocolViolation {
            line: line.to_string(),
        });
    };
    Ok(kind)
}

/// Produce feedback from the difference between two versions of a text.
///
/// `label` names the file on both sides of the header; without one the
/// headers read `actual` and `expected`. Identical inputs yield no chunks.
pub fn diff(before: &str, after: &str, label: Option<&str>) -> Vec<FeedbackChunk> {
    if before == after {
        return Vec::new();
    }

    let from = label.unwrap_or(ACTUAL_LABEL);
    chunk_lines(unified_lines(before, after, label), from)
        .into_iter()
        .skip(1) // nothing precedes the first header
        .collect()
}

/// The full unified diff between `before` and `after`, one entry per line.
pub fn unified_lines(before: &str, after: &str, label: Option<&str>) -> Vec<String> {
    let (from, to) = match label {
        Some(label) => (label, label),
        None => (ACTUAL_LABEL, EXPECTED_LABEL),
    };

    let text_diff = TextDiff::from_lines(before, after);
    let mut unified = text_diff.unified_diff();
    unified.context_radius(CONTEXT_RADIUS);

    let mut lines = Vec::new();
    for hunk in unified.iter_hunks() {
        if lines.is_empty() {
            lines.push(format!("--- {from}\n"));
            lines.push(format!("+++ {to}\n"));
        }
        lines.push(terminated(hunk.header().to_string()));
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            lines.push(terminated(format!("{sign}{}", change.to_string_lossy())));
        }
    }
    lines
}

/// Split diff lines into chunks, starting a new chunk at every
/// `--- <from>` header line.
///
/// The first returned chunk holds whatever preceded the first header and is
/// empty for well-formed diff output.
pub fn chunk_lines<I>(lines: I, from: &str) -> Vec<FeedbackChunk>
where
    I: IntoIterator<Item = String>,
{
    let header = format!("--- {from}\n");
    let mut chunks = Vec::new();
    let mut current = Vec::new();
    for line in lines {
        if line == header {
            chunks.push(FeedbackChunk {
                lines: std::mem::take(&mut current),
            });
        }
        current.push(line);
    }
    chunks.push(FeedbackChunk { lines: current });
    chunks
}

fn terminated(mut line: String) -> String {
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_inputs_produce_no_feedback() {
        assert!(diff("same\n", "same\n", None).is_empty());
        assert!(diff("", "", Some("a.json")).is_empty());
    }

    #[test]
    fn test_diff_uses_actual_expected_without_label() {
        let chunks = diff("a\n", "b\n", None);
        assert_eq!(chunks.len(), 1);
        let lines = chunks[0].lines();
        assert_eq!(lines[0], "--- actual\n");
        assert_eq!(lines[1], "+++ expected\n");
        assert!(lines[2].starts_with("@@"));
        assert!(lines.contains(&"-a\n".to_string()));
        assert!(lines.contains(&"+b\n".to_string()));
    }

    #[test]
    fn test_diff_uses_label_on_both_sides() {
        let chunks = diff("a\n", "b\n", Some("dir/x.json"));
        let lines = chunks[0].lines();
        assert_eq!(lines[0], "--- dir/x.json\n");
        assert_eq!(lines[1], "+++ dir/x.json\n");
    }

    #[test]
    fn test_missing_trailing_newline_is_terminated() {
        let chunks = diff("{\"a\":1}", "{\n  \"a\": 1\n}\n", Some("x.json"));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].lines().iter().all(|line| line.ends_with('\n')));
        assert!(chunks[0].lines().contains(&"-{\"a\":1}\n".to_string()));
    }

    #[test]
    fn test_chunks_concatenate_to_unified_diff() {
        let before = "one\ntwo\nthree\n";
        let after = "one\n2\nthree\nfour\n";
        let expected: String = unified_lines(before, after, None).concat();
        let actual: String = diff(before, after, None)
            .iter()
            .map(|chunk| chunk.to_string())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_chunk_lines_splits_on_header() {
        let lines = vec![
            "--- f\n", "+++ f\n", "@@ -1 +1 @@\n", "-a\n", "+b\n", "--- f\n", "+++ f\n",
            "@@ -1 +1 @@\n", "-c\n", "+d\n",
        ]
        .into_iter()
        .map(String::from);
        let chunks = chunk_lines(lines, "f");
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].is_empty());
        assert_eq!(chunks[1].len(), 5);
        assert_eq!(chunks[2].lines()[4], "+d\n");
    }

    #[test]
    fn test_classify_line() {
        assert_eq!(classify_line("").unwrap(), LineKind::Context);
        assert_eq!(classify_line(" ctx\n").unwrap(), LineKind::Context);
        assert_eq!(classify_line("--- a").unwrap(), LineKind::Header);
        assert_eq!(classify_line("+++ a").unwrap(), LineKind::Header);
        assert_eq!(classify_line("@@ -1 +1 @@").unwrap(), LineKind::Range);
        assert_eq!(classify_line("+new").unwrap(), LineKind::Addition);
        assert_eq!(classify_line("-old").unwrap(), LineKind::Removal);
    }

    #[test]
    fn test_classify_rejects_unknown_shape() {
        let err = classify_line("\\ No newline at end of file").unwrap_err();
        assert!(matches!(err, DiffError::ProtocolViolation { .. }));
    }

    #[test]
    fn test_generated_chunks_classify_cleanly() {
        let chunks = diff("x\ny\n", "y\nz\n", Some("f.txt"));
        for chunk in &chunks {
            for item in chunk.classified() {
                assert!(item.is_ok());
            }
        }
    }
}
