use std::io::{self, Write};

use serde::Serialize;

use super::TestReport;

/// Receives the launcher's output and the final report
///
/// Implement this trait to change how a test run is presented.
pub trait TestReporter {
    /// Called for every line the console launcher writes to stdout
    fn on_output_line(&mut self, line: &str);

    /// Called once the launcher has exited
    fn on_run_complete(&mut self, report: &TestReport) -> io::Result<()>;
}

/// Streams launcher output and prints a colored one-line summary
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    /// The `====== ... ======` line, with ANSI colors
    pub fn summary_line(report: &TestReport) -> String {
        let color = if report.passed() {
            "\x1b[1;32m"
        } else {
            "\x1b[1;31m"
        };

        let Some(summary) = &report.summary else {
            return format!(
                "{}====== no test summary (launcher exited with {}) ======\x1b[0m",
                color, report.launcher_exit_code
            );
        };

        let mut parts = Vec::new();
        if summary.tests_successful > 0 {
            parts.push(format!("{} passed", summary.tests_successful));
        }
        if summary.tests_failed > 0 {
            parts.push(format!("{} failed", summary.tests_failed));
        }
        if summary.tests_skipped > 0 {
            parts.push(format!("{} skipped", summary.tests_skipped));
        }
        if summary.tests_aborted > 0 {
            parts.push(format!("{} aborted", summary.tests_aborted));
        }
        if summary.containers_failed > 0 {
            parts.push(format!("{} containers failed", summary.containers_failed));
        }
        if parts.is_empty() {
            parts.push("no tests ran".to_string());
        }

        let seconds = summary.duration_ms.unwrap_or(0) as f64 / 1000.0;
        format!(
            "{}====== {} in {:.2}s ======\x1b[0m",
            color,
            parts.join(", "),
            seconds
        )
    }
}

impl TestReporter for ConsoleReporter {
    fn on_output_line(&mut self, line: &str) {
        println!("{}", line);
    }

    fn on_run_complete(&mut self, report: &TestReport) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout)?;
        writeln!(stdout, "{}", Self::summary_line(report))?;
        stdout.flush()
    }
}

/// Keeps stdout machine-readable: launcher output goes to stderr, the report
/// to stdout as JSON
#[derive(Debug, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: &'a str,
    exit_code: i32,
    launcher_exit_code: i32,
    summary: Option<&'a super::TestSummary>,
}

impl TestReporter for JsonReporter {
    fn on_output_line(&mut self, line: &str) {
        eprintln!("{}", line);
    }

    fn on_run_complete(&mut self, report: &TestReport) -> io::Result<()> {
        let json = JsonReport {
            status: report.status(),
            exit_code: report.exit_code(),
            launcher_exit_code: report.launcher_exit_code,
            summary: report.summary.as_ref(),
        };
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &json)?;
        writeln!(stdout)?;
        stdout.flush()
    }
}
