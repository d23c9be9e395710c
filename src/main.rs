use std::process::ExitCode;

use clap::Parser;
use regex_harness::cli::{Cli, Command, OutputFormat};
use regex_harness::error::{HarnessError, EXIT_SETUP_FAILURE};
use regex_harness::harness::{Harness, HarnessOptions};
use regex_harness::testing::{ConsoleReporter, JsonReporter, TestOptions, TestReporter};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Exit code for an error that stopped the harness before a task finished
fn setup_exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<HarnessError>()
        .map_or(EXIT_SETUP_FAILURE, HarnessError::exit_code)
}

fn execute(cli: Cli) -> anyhow::Result<i32> {
    let options = HarnessOptions {
        project_dir: cli.project_dir,
        config: cli.config,
        offline: cli.offline,
        refresh_dependencies: cli.refresh_dependencies,
    };
    let mut harness = Harness::configure(&options)?;

    match cli.command {
        Command::Test {
            details,
            include_tags,
            exclude_tags,
            format,
        } => {
            let test_options = TestOptions {
                details,
                include_tags,
                exclude_tags,
            };
            let mut reporter: Box<dyn TestReporter> = match format {
                OutputFormat::Text => Box::new(ConsoleReporter::new()),
                OutputFormat::Json => Box::new(JsonReporter::new()),
            };
            let report = harness.test(&test_options, reporter.as_mut())?;
            Ok(report.exit_code())
        }
        Command::RunBenchmarks => Ok(harness.run_benchmarks()?.exit_code),
        Command::Run { args } => Ok(harness.run(args)?.exit_code),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(cli.debug);

    let code = match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            setup_exit_code(&err)
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
