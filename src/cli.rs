//! CLI argument parsing for regex-harness

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for the test report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Launcher output plus a colored summary line (default)
    #[default]
    Text,
    /// JSON report on stdout, launcher output on stderr
    Json,
}

/// Console launcher detail level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum DetailsMode {
    /// One line per container and test, drawn as a tree (default)
    #[default]
    Tree,
    /// One line per event
    Flat,
    /// Summary and failures only
    None,
}

impl DetailsMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailsMode::Tree => "tree",
            DetailsMode::Flat => "flat",
            DetailsMode::None => "none",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "regex-harness")]
#[command(version)]
#[command(
    about = "Run, test, and benchmark the syspro.tm.RegexApp module",
    long_about = None
)]
pub struct Cli {
    /// Configuration file (default: harness.toml in the project directory, if present)
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Project directory; relative paths in the configuration resolve against it
    #[arg(long = "project-dir", value_name = "DIR", default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Use cached resolutions only, regardless of age
    #[arg(long = "offline", global = true)]
    pub offline: bool,

    /// Ignore cached resolutions and resolve again
    #[arg(
        long = "refresh-dependencies",
        global = true,
        conflicts_with = "offline"
    )]
    pub refresh_dependencies: bool,

    /// Enable debug tracing output (logs to stderr)
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the test suite through the JUnit Platform console launcher
    Test {
        /// Launcher detail level
        #[arg(long = "details", value_enum, default_value = "tree")]
        details: DetailsMode,

        /// Only run tests with this tag (repeatable)
        #[arg(long = "include-tag", value_name = "TAG")]
        include_tags: Vec<String>,

        /// Skip tests with this tag (repeatable)
        #[arg(long = "exclude-tag", value_name = "TAG")]
        exclude_tags: Vec<String>,

        /// Report format (text or json)
        #[arg(long = "format", value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the entry point with --no-tests and relay its exit code
    #[command(name = "runBenchmarks", alias = "run-benchmarks")]
    RunBenchmarks,

    /// Run the application module
    Run {
        /// Arguments passed to the entry point
        #[arg(last = true, value_name = "ARGS")]
        args: Vec<String>,
    },
}
