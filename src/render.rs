//! Console rendering of feedback.

use crate::diff::{DiffError, FeedbackChunk, LineKind};
use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("failed to write feedback: {0}")]
    Io(#[from] io::Error),
}

/// Receives feedback as soon as a file has been processed.
pub trait Reporter {
    fn report(&mut self, path: &Path, chunks: &[FeedbackChunk]) -> Result<(), RenderError>;
}

/// Writes colorized diff chunks to a stream.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, _path: &Path, chunks: &[FeedbackChunk]) -> Result<(), RenderError> {
        for chunk in chunks {
            // A chunk is rendered in full or not at all
            let rendered = render_chunk(chunk)?;
            for line in rendered {
                writeln!(self.out, "{line}")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Colorize every line of a chunk according to its diff role.
pub fn render_chunk(chunk: &FeedbackChunk) -> Result<Vec<String>, DiffError> {
    chunk
        .classified()
        .map(|item| -> Result<String, DiffError> {
            let (kind, text) = item?;
            Ok(match kind {
                LineKind::Context => text.to_string(),
                LineKind::Header => text.bold().to_string(),
                LineKind::Range => text.cyan().to_string(),
                LineKind::Addition => text.green().to_string(),
                LineKind::Removal => text.red().to_string(),
            })
        })
        .collect()
}
