use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Counts from the console launcher's closing summary block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub tests_found: u64,
    pub tests_started: u64,
    pub tests_successful: u64,
    pub tests_failed: u64,
    pub tests_skipped: u64,
    pub tests_aborted: u64,
    pub containers_found: u64,
    pub containers_failed: u64,
    /// From `Test run finished after N ms`
    pub duration_ms: Option<u64>,
}

impl TestSummary {
    /// No test and no container failed
    pub fn is_clean(&self) -> bool {
        self.tests_failed == 0 && self.containers_failed == 0
    }
}

fn ansi_escape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("ansi regex should compile"))
}

fn count_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\[\s*(\d+)\s+(tests|containers)\s+(found|skipped|started|aborted|successful|failed)\s*\]",
        )
        .expect("summary regex should compile")
    })
}

fn finished_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^Test run finished after (\d+) ms").expect("duration regex should compile")
    })
}

/// Incremental parser fed one output line at a time
#[derive(Debug, Default)]
pub struct SummaryParser {
    summary: TestSummary,
    seen: bool,
}

impl SummaryParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        let plain = ansi_escape().replace_all(line, "");
        let plain = plain.trim();

        if let Some(caps) = finished_line().captures(plain) {
            self.summary.duration_ms = caps[1].parse().ok();
            return;
        }

        let Some(caps) = count_line().captures(plain) else {
            return;
        };
        let Ok(count) = caps[1].parse::<u64>() else {
            return;
        };
        let slot = match (&caps[2], &caps[3]) {
            ("tests", "found") => &mut self.summary.tests_found,
            ("tests", "started") => &mut self.summary.tests_started,
            ("tests", "successful") => &mut self.summary.tests_successful,
            ("tests", "failed") => &mut self.summary.tests_failed,
            ("tests", "skipped") => &mut self.summary.tests_skipped,
            ("tests", "aborted") => &mut self.summary.tests_aborted,
            ("containers", "found") => &mut self.summary.containers_found,
            ("containers", "failed") => &mut self.summary.containers_failed,
            _ => {
                self.seen = true;
                return;
            }
        };
        *slot = count;
        self.seen = true;
    }

    /// The summary, or `None` when no summary block appeared
    pub fn finish(self) -> Option<TestSummary> {
        self.seen.then_some(self.summary)
    }
}
