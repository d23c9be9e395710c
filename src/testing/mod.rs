//! Test runner built on the JUnit Platform console launcher
//!
//! The launcher runs under the same execution flags as every other task. Its
//! stdout is streamed through a [`TestReporter`] while a [`SummaryParser`]
//! picks up the closing counts block.

mod reporter;
mod runner;
mod summary;

pub use reporter::{ConsoleReporter, JsonReporter, TestReporter};
pub use runner::{TestOptions, TestTask};
pub use summary::{SummaryParser, TestSummary};

use crate::error::EXIT_TEST_FAILURE;

/// Aggregate result of one test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestReport {
    /// `None` when the suite never reached the summary (failed to start)
    pub summary: Option<TestSummary>,
    pub launcher_exit_code: i32,
}

impl TestReport {
    /// Clean summary and a zero launcher exit
    pub fn passed(&self) -> bool {
        self.launcher_exit_code == 0 && self.summary.as_ref().is_some_and(TestSummary::is_clean)
    }

    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            EXIT_TEST_FAILURE
        }
    }

    pub fn status(&self) -> &'static str {
        match (&self.summary, self.passed()) {
            (_, true) => "passed",
            (None, false) => "error",
            (Some(_), false) => "failed",
        }
    }
}
