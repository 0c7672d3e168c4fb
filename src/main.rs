use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{debug, error, warn};
use xfmt::config;
use xfmt::{ConsoleReporter, Mode, Registry, RunOptions, Runner};

/// Width the exit indicator spans, in columns.
const INDICATOR_WIDTH: usize = 88;

#[derive(Parser)]
#[command(name = "xfmt")]
#[command(about = "Recursively check formatting of files under paths", long_about = None)]
#[command(version)]
struct Cli {
    /// Files or directories to check
    #[arg(required_unless_present = "list_plugins")]
    paths: Vec<PathBuf>,

    /// Rewrite files into their canonical form
    #[arg(long)]
    fix: bool,

    /// Exit non-zero when any file needs formatting
    #[arg(long)]
    strict: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Include dot-files and dot-directories
    #[arg(long)]
    hidden: bool,

    /// Settings file (defaults to ./xfmt.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose (info-level) logging.
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Enable debug-level logging.
    #[arg(long)]
    debug: bool,

    /// List registered plugins and exit
    #[arg(long)]
    list_plugins: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match real_main(cli) {
        Ok(code) => {
            exit_indicator(code == 0);
            ExitCode::from(code)
        }
        Err(err) => {
            error!("{err:#}");
            eprintln!("{} {:#}", "error:".red().bold(), err);
            exit_indicator(false);
            ExitCode::from(1)
        }
    }
}

fn real_main(cli: Cli) -> Result<u8> {
    let cwd = env::current_dir().context("cannot determine working directory")?;
    let settings = config::resolve(cli.config.as_deref(), &cwd)?;

    let log_file = cli.log_file.as_deref().or(settings.log_file.as_deref());
    init_logging(cli.verbose, cli.debug, log_file)?;

    let mut registry = Registry::builtin();
    for unknown in registry.disable(&settings.disabled_plugins) {
        match unknown.suggestion {
            Some(suggestion) => warn!(
                "Cannot disable unknown plugin '{}' (did you mean '{}'?)",
                unknown.name, suggestion
            ),
            None => warn!("Cannot disable unknown plugin '{}'", unknown.name),
        }
    }

    if cli.list_plugins {
        for (category, name) in registry.names() {
            println!("{category}\t{name}");
        }
        return Ok(0);
    }

    let plugins = registry.discover()?;
    debug!("{} plugin(s) active", plugins.len());

    let mode = if cli.fix { Mode::Fix } else { Mode::Check };
    let options = RunOptions {
        collect: xfmt::CollectOptions {
            include_hidden: cli.hidden || settings.include_hidden,
        },
        fail_fast: cli.fail_fast || settings.fail_fast,
    };
    let strict = cli.strict || settings.strict;

    let runner = Runner::new(&plugins, mode, options);
    let report = runner.run(&cli.paths, &mut ConsoleReporter::stdout())?;

    for diagnostic in &report.diagnostics {
        eprintln!("{} {}", "error:".red().bold(), diagnostic);
    }
    for (path, outcome) in &report.files {
        if let xfmt::FileOutcome::Failed(reason) = outcome {
            eprintln!("{} {}: {}", "failed:".red().bold(), path.display(), reason);
        }
    }

    Ok(report.exit_code(strict))
}

fn init_logging(verbose: bool, debug: bool, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .with(filter)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init();
        }
    }

    debug!("Logging initialized at level: {}", level);
    Ok(())
}

/// One line of sunshine or storm on stderr, so a glance tells how it went.
fn exit_indicator(ok: bool) {
    // Leave two blank columns at the end for symmetry
    let symbol = if ok { "  ☀️" } else { "  ⛈" };
    eprintln!("{}", symbol.repeat((INDICATOR_WIDTH - 2) / 3));
}
