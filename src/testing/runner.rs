use std::ffi::OsString;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use crate::cli::DetailsMode;
use crate::error::{HarnessError, Result};
use crate::exec::{
    exit_code_of, Classpath, ExecutionConfig, Launcher, MainTarget, TaskInvocation,
    TaskLifecycle, TaskState,
};

use super::{SummaryParser, TestReport, TestReporter};

/// Selection and verbosity passed to the console launcher
#[derive(Debug, Clone, Default)]
pub struct TestOptions {
    pub details: DetailsMode,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
}

/// Runs the JUnit Platform console launcher over the test classpath
#[derive(Debug)]
pub struct TestTask {
    invocation: TaskInvocation,
    lifecycle: TaskLifecycle,
}

impl TestTask {
    pub const NAME: &'static str = "test";

    /// `console_jar` is the resolved standalone launcher; `classpath` holds
    /// the test classes, main classes, and the resolved dependency.
    /// Discovery is limited to `scan_roots`, the test class directories.
    pub fn new(
        console_jar: PathBuf,
        scan_roots: &Classpath,
        classpath: Classpath,
        launcher: Arc<Launcher>,
        execution: Arc<ExecutionConfig>,
        options: &TestOptions,
    ) -> Result<Self> {
        if classpath.is_empty() {
            return Err(HarnessError::Config("test classpath is empty".to_string()));
        }

        let mut args: Vec<OsString> = vec![
            "execute".into(),
            "--class-path".into(),
            classpath.to_arg()?,
            scan_arg(scan_roots)?,
            "--disable-banner".into(),
            format!("--details={}", options.details.as_str()).into(),
        ];
        for tag in &options.include_tags {
            args.push("--include-tag".into());
            args.push(tag.into());
        }
        for tag in &options.exclude_tags {
            args.push("--exclude-tag".into());
            args.push(tag.into());
        }

        let mut lifecycle = TaskLifecycle::new(Self::NAME);
        lifecycle.transition(TaskState::Configured)?;
        Ok(Self {
            invocation: TaskInvocation {
                name: Self::NAME.to_string(),
                classpath: Arc::new(classpath),
                launcher,
                main: MainTarget::Jar(console_jar),
                args,
                execution,
            },
            lifecycle,
        })
    }

    pub fn invocation(&self) -> &TaskInvocation {
        &self.invocation
    }

    pub fn state(&self) -> TaskState {
        self.lifecycle.state()
    }

    /// Launch, stream stdout through `reporter`, and build the report
    ///
    /// A failing suite is an `Ok` report with a non-zero exit code; only
    /// launch problems are errors.
    pub fn run(&mut self, reporter: &mut dyn TestReporter) -> Result<TestReport> {
        let mut command = self.invocation.to_command()?;
        command.stdout(Stdio::piped()).stderr(Stdio::inherit());
        tracing::info!("Launching task '{}': {:?}", Self::NAME, command);

        self.lifecycle.transition(TaskState::Running)?;
        let program = self.invocation.launcher.program().display().to_string();
        let mut child = command.spawn().map_err(|source| HarnessError::Launch {
            program: program.clone(),
            source,
        })?;

        let mut parser = SummaryParser::new();
        if let Some(stdout) = child.stdout.take() {
            let streamed = for_each_line(BufReader::new(stdout), |line| {
                reporter.on_output_line(line);
                parser.feed(line);
            });
            if let Err(e) = streamed {
                tracing::warn!("Stopped reading console launcher output: {}", e);
            }
        }
        let status = child
            .wait()
            .map_err(|source| HarnessError::Launch { program, source })?;

        let report = TestReport {
            summary: parser.finish(),
            launcher_exit_code: exit_code_of(status),
        };
        if report.summary.is_none() {
            tracing::warn!("Console launcher produced no test summary");
        }
        self.lifecycle.finish(report.exit_code())?;
        reporter.on_run_complete(&report)?;
        Ok(report)
    }
}

/// `--scan-class-path=<roots>`, or the bare flag when no test directory exists
fn scan_arg(scan_roots: &Classpath) -> Result<OsString> {
    if scan_roots.is_empty() {
        return Ok("--scan-class-path".into());
    }
    let mut arg = OsString::from("--scan-class-path=");
    arg.push(scan_roots.to_arg()?);
    Ok(arg)
}

/// Feed each output line to `on_line`, without its line ending
///
/// Bytes that are not UTF-8 are replaced rather than rejected.
fn for_each_line<R: BufRead>(mut reader: R, mut on_line: impl FnMut(&str)) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        on_line(line.trim_end_matches(['\n', '\r']));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionSettings;
    use crate::module::ModuleRef;

    fn task(options: &TestOptions) -> TestTask {
        let module = ModuleRef::new("syspro.tm.RegexApp").unwrap();
        let execution =
            Arc::new(ExecutionConfig::new(&module, &ExecutionSettings::default()).unwrap());
        TestTask::new(
            PathBuf::from("/cache/console.jar"),
            &Classpath::new().with(["/out/test"]),
            Classpath::new().with(["/out/test", "/out/main"]),
            Arc::new(Launcher::new("java")),
            execution,
            options,
        )
        .unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_command_line_layout() {
        let line = task(&TestOptions::default()).invocation().command_line().unwrap();
        let expected: Vec<OsString> = [
            "--enable-native-access=syspro.tm.RegexApp",
            "-jar",
            "/cache/console.jar",
            "execute",
            "--class-path",
            "/out/test:/out/main",
            "--scan-class-path=/out/test",
            "--disable-banner",
            "--details=tree",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        assert_eq!(line, expected);
    }

    #[test]
    fn test_tags_forwarded() {
        let options = TestOptions {
            details: DetailsMode::Flat,
            include_tags: vec!["native".to_string()],
            exclude_tags: vec!["slow".to_string()],
        };
        let line = task(&options).invocation().command_line().unwrap();
        let pos = |s: &str| line.iter().position(|a| a == s).unwrap();
        assert_eq!(line[pos("--include-tag") + 1], "native");
        assert_eq!(line[pos("--exclude-tag") + 1], "slow");
        assert!(line.contains(&OsString::from("--details=flat")));
    }

    #[test]
    fn test_new_task_is_configured() {
        assert_eq!(task(&TestOptions::default()).state(), TaskState::Configured);
    }

    #[test]
    fn test_scan_arg_without_roots_is_bare_flag() {
        assert_eq!(
            scan_arg(&Classpath::new()).unwrap(),
            OsString::from("--scan-class-path")
        );
    }

    #[test]
    fn test_for_each_line_replaces_invalid_utf8() {
        let output: &[u8] = b"RegexTest > latin1Match(caf\xe9) PASSED\r\n[ 1 tests successful ]\nlast";
        let mut lines = Vec::new();
        for_each_line(io::Cursor::new(output), |line| lines.push(line.to_string())).unwrap();
        assert_eq!(
            lines,
            vec![
                "RegexTest > latin1Match(caf\u{FFFD}) PASSED".to_string(),
                "[ 1 tests successful ]".to_string(),
                "last".to_string(),
            ]
        );
    }
}
