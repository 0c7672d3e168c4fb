//! xfmt: pluggable file-format checking and fixing
//!
//! Files are discovered under one or more roots, matched against registered
//! plugins, and compared with the canonical form each plugin defines. The
//! difference is reported as unified diff feedback, or applied in place when
//! fixing.
//!
//! # Architecture
//!
//! - [`registry`]: named plugin factories, instantiated once per run
//! - [`plugin`]: the `Checker`/`Formatter` capability traits
//! - [`collect`]: root-bounded recursive file discovery
//! - [`dispatch`]: routing one file to every plugin that claims it
//! - [`diff`]: unified diff computation and chunking
//! - [`run`]: one pass over all targets, producing a [`RunReport`]
//!
//! # Safety
//!
//! - Collected paths never resolve outside their collection root
//! - Rewrites are atomic (tempfile + fsync + rename)
//! - Rewrites are refused if the file changed since it was read
//! - Checking never writes
//!
//! # Example
//!
//! ```no_run
//! use xfmt::{ConsoleReporter, Mode, Registry, RunOptions, Runner};
//! use std::path::PathBuf;
//!
//! let plugins = Registry::builtin().discover().expect("builtin plugins");
//! let runner = Runner::new(&plugins, Mode::Check, RunOptions::default());
//! let report = runner
//!     .run(&[PathBuf::from(".")], &mut ConsoleReporter::stdout())
//!     .expect("render feedback");
//! println!("{} file(s) need formatting", report.with_feedback());
//! ```

pub mod collect;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod edit;
pub mod plugin;
pub mod plugins;
pub mod registry;
pub mod render;
pub mod run;
pub mod safety;

// Re-exports
pub use collect::{collect, CollectError, CollectOptions, Collected};
pub use config::{ConfigError, Settings};
pub use diff::{classify_line, diff, DiffError, FeedbackChunk, LineKind};
pub use dispatch::{dispatch, DispatchError, Mode};
pub use edit::{EditError, EditResult, EditVerification, Rewrite};
pub use plugin::{
    Canonicalizer, Checker, Formatter, MalformedContent, Plugin, PluginError, TextPlugin,
};
pub use registry::{Category, DiscoveryError, PluginFactory, Registry, RegistryError, UnknownName};
pub use render::{ConsoleReporter, RenderError, Reporter};
pub use run::{FileOutcome, RunError, RunOptions, RunReport, Runner};
pub use safety::{RootGuard, SafetyError};
