//! One pass over a set of targets.
//!
//! The runner collects files under every target, dispatches each to the
//! plugins, hands feedback to a [`Reporter`] as soon as it is produced and
//! records a [`FileOutcome`] per file. Nothing here touches the process exit
//! status; the caller decides what a [`RunReport`] means.

use crate::collect::{collect, CollectOptions};
use crate::diff::FeedbackChunk;
use crate::dispatch::{dispatch, Mode};
use crate::plugin::Plugin;
use crate::render::{RenderError, Reporter};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Render(#[from] RenderError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub collect: CollectOptions,
    /// Stop after the first file that fails
    pub fail_fast: bool,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Already canonical
    Conforming,
    /// Not canonical (check) or rewritten (fix)
    Feedback(Vec<FeedbackChunk>),
    /// No plugin claims the file
    Unmatched,
    /// A plugin failed on the file
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub mode: Mode,
    pub files: Vec<(PathBuf, FileOutcome)>,
    /// Problems not tied to a single file, such as a missing target
    pub diagnostics: Vec<String>,
    /// Set when fail-fast stopped the run early
    pub aborted: bool,
}

impl RunReport {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// No file failed and no run-level problem was recorded.
    pub fn success(&self) -> bool {
        self.diagnostics.is_empty() && self.failed() == 0
    }

    pub fn has_feedback(&self) -> bool {
        self.with_feedback() > 0
    }

    pub fn conforming(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Conforming))
    }

    pub fn with_feedback(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Feedback(_)))
    }

    pub fn unmatched(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Unmatched))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, FileOutcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }

    pub fn outcome(&self, path: &Path) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|(file, _)| file == path)
            .map(|(_, outcome)| outcome)
    }

    /// Process exit status for this run.
    ///
    /// With `strict`, a check run that found non-canonical files also fails.
    pub fn exit_code(&self, strict: bool) -> u8 {
        if !self.success() {
            return 1;
        }
        if strict && self.mode == Mode::Check && self.has_feedback() {
            return 1;
        }
        0
    }
}

pub struct Runner<'a> {
    plugins: &'a [Plugin],
    mode: Mode,
    options: RunOptions,
}

impl<'a> Runner<'a> {
    pub fn new(plugins: &'a [Plugin], mode: Mode, options: RunOptions) -> Self {
        Self {
            plugins,
            mode,
            options,
        }
    }

    /// Process every file under `targets`.
    ///
    /// A target that is a file is processed directly; a directory is
    /// collected. Each file is processed at most once even when targets
    /// overlap.
    pub fn run(
        &self,
        targets: &[PathBuf],
        reporter: &mut dyn Reporter,
    ) -> Result<RunReport, RunError> {
        info!("Running {} over {} target(s)", self.mode, targets.len());
        let mut report = RunReport::new(self.mode);
        let mut seen = HashSet::new();

        'targets: for target in targets {
            if target.is_file() {
                if seen.insert(identity(target))
                    && self.process(target, reporter, &mut report)?.is_break()
                {
                    break 'targets;
                }
                continue;
            }

            let paths = match collect(target, self.options.collect) {
                Ok(paths) => paths,
                Err(err) => {
                    error!("Cannot collect from {}: {}", target.display(), err);
                    report.diagnostics.push(err.to_string());
                    continue;
                }
            };

            for item in paths {
                let path = match item {
                    Ok(relative) => target.join(relative),
                    Err(err) => {
                        error!("Error while collecting {}: {}", target.display(), err);
                        report.diagnostics.push(err.to_string());
                        continue;
                    }
                };
                if !seen.insert(identity(&path)) {
                    continue;
                }
                if self.process(&path, reporter, &mut report)?.is_break() {
                    break 'targets;
                }
            }
        }

        info!(
            "{} file(s): {} conforming, {} with feedback, {} unmatched, {} failed",
            report.files.len(),
            report.conforming(),
            report.with_feedback(),
            report.unmatched(),
            report.failed()
        );
        Ok(report)
    }

    fn process(
        &self,
        path: &Path,
        reporter: &mut dyn Reporter,
        report: &mut RunReport,
    ) -> Result<ControlFlow<()>, RunError> {
        info!("Checking {}", path.display());

        let outcome = match dispatch(path, self.plugins, self.mode) {
            Ok(chunks) if chunks.is_empty() => FileOutcome::Conforming,
            Ok(chunks) => {
                reporter.report(path, &chunks)?;
                FileOutcome::Feedback(chunks)
            }
            Err(err) if err.is_unmatched() => {
                debug!("{}", err);
                FileOutcome::Unmatched
            }
            Err(err) => {
                error!("{}: {}", path.display(), err);
                FileOutcome::Failed(err.to_string())
            }
        };

        let stop = self.options.fail_fast && matches!(outcome, FileOutcome::Failed(_));
        report.files.push((path.to_path_buf(), outcome));
        if stop {
            report.aborted = true;
            return Ok(ControlFlow::Break(()));
        }
        Ok(ControlFlow::Continue(()))
    }
}

/// Key under which a file counts as already processed.
fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use std::fs;

    #[derive(Default)]
    struct Recorder {
        reports: Vec<(PathBuf, usize)>,
    }

    impl Reporter for Recorder {
        fn report(&mut self, path: &Path, chunks: &[FeedbackChunk]) -> Result<(), RenderError> {
            self.reports.push((path.to_path_buf(), chunks.len()));
            Ok(())
        }
    }

    fn sample_tree() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("x.json"), r#"{"b":1,"a":2}"#).unwrap();
        fs::write(root.join("y.sh"), "echo hi\n").unwrap();
        temp_dir
    }

    #[test]
    fn test_check_run_reports_feedback_and_unmatched() {
        let temp_dir = sample_tree();
        let root = temp_dir.path().to_path_buf();
        let plugins = Registry::builtin().discover().unwrap();
        let mut recorder = Recorder::default();

        let report = Runner::new(&plugins, Mode::Check, RunOptions::default())
            .run(&[root.clone()], &mut recorder)
            .unwrap();

        assert_eq!(recorder.reports, vec![(root.join("x.json"), 1)]);
        assert_eq!(report.unmatched(), 1);
        assert!(matches!(
            report.outcome(&root.join("y.sh")),
            Some(FileOutcome::Unmatched)
        ));
        assert!(report.success());
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 1);
    }

    #[test]
    fn test_fix_run_rewrites_matched_files_only() {
        let temp_dir = sample_tree();
        let root = temp_dir.path().to_path_buf();
        let plugins = Registry::builtin().discover().unwrap();
        let mut recorder = Recorder::default();

        let report = Runner::new(&plugins, Mode::Fix, RunOptions::default())
            .run(&[root.clone()], &mut recorder)
            .unwrap();

        assert_eq!(report.with_feedback(), 1);
        assert_eq!(report.exit_code(true), 0);
        assert_eq!(
            fs::read_to_string(root.join("x.json")).unwrap(),
            "{\n  \"a\": 2,\n  \"b\": 1\n}\n"
        );
        assert_eq!(fs::read_to_string(root.join("y.sh")).unwrap(), "echo hi\n");
    }

    #[test]
    fn test_malformed_file_fails_but_run_continues() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::write(root.join("a_bad.json"), "{").unwrap();
        fs::write(root.join("b_good.json"), "[1]").unwrap();
        let plugins = Registry::builtin().discover().unwrap();

        let report = Runner::new(&plugins, Mode::Check, RunOptions::default())
            .run(&[root.clone()], &mut Recorder::default())
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.with_feedback(), 1);
        assert!(!report.success());
        assert_eq!(report.exit_code(false), 1);
    }

    #[test]
    fn test_fail_fast_stops_after_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path().to_path_buf();
        fs::write(root.join("a_bad.json"), "{").unwrap();
        fs::write(root.join("b_good.json"), "[1]").unwrap();
        let plugins = Registry::builtin().discover().unwrap();
        let options = RunOptions {
            fail_fast: true,
            ..RunOptions::default()
        };

        let report = Runner::new(&plugins, Mode::Check, options)
            .run(&[root.clone()], &mut Recorder::default())
            .unwrap();

        assert!(report.aborted);
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_file_targets_and_overlap_are_deduplicated() {
        let temp_dir = sample_tree();
        let root = temp_dir.path().to_path_buf();
        let plugins = Registry::builtin().discover().unwrap();

        let report = Runner::new(&plugins, Mode::Check, RunOptions::default())
            .run(
                &[root.join("x.json"), root.clone(), root.join("x.json")],
                &mut Recorder::default(),
            )
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.files[0].0, root.join("x.json"));
    }

    #[test]
    fn test_differently_spelled_targets_are_deduplicated() {
        let temp_dir = sample_tree();
        let root = temp_dir.path().to_path_buf();
        fs::create_dir(root.join("sub")).unwrap();
        let plugins = Registry::builtin().discover().unwrap();
        let mut recorder = Recorder::default();

        let report = Runner::new(&plugins, Mode::Check, RunOptions::default())
            .run(
                &[root.join("sub/../x.json"), root.join("sub").join(".."), root.clone()],
                &mut recorder,
            )
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(recorder.reports.len(), 1);
        assert_eq!(report.files[0].0, root.join("sub/../x.json"));
    }

    #[test]
    fn test_missing_target_is_a_diagnostic() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plugins = Registry::builtin().discover().unwrap();

        let report = Runner::new(&plugins, Mode::Check, RunOptions::default())
            .run(&[temp_dir.path().join("gone")], &mut Recorder::default())
            .unwrap();

        assert!(report.files.is_empty());
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.exit_code(false), 1);
    }
}
