use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::sync::Arc;

use crate::error::{HarnessError, Result};
use crate::module::ModuleRef;

use super::{Classpath, ExecutionConfig, Launcher};

/// Flag telling the entry point to run benchmarks instead of its self-tests
pub const NO_TESTS_FLAG: &str = "--no-tests";

/// Lifecycle of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Unconfigured,
    Configured,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    pub fn can_transition_to(self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (TaskState::Unconfigured, TaskState::Configured)
                | (TaskState::Configured, TaskState::Running)
                | (TaskState::Running, TaskState::Succeeded)
                | (TaskState::Running, TaskState::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Unconfigured => "unconfigured",
            TaskState::Configured => "configured",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State tracker for one named task
#[derive(Debug, Clone)]
pub struct TaskLifecycle {
    task: String,
    state: TaskState,
}

impl TaskLifecycle {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            state: TaskState::Unconfigured,
        }
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn transition(&mut self, to: TaskState) -> Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(HarnessError::State {
                task: self.task.clone(),
                from: self.state,
                to,
            });
        }
        tracing::debug!("Task '{}': {} -> {}", self.task, self.state, to);
        self.state = to;
        Ok(())
    }

    /// Move a running task to its terminal state
    pub fn finish(&mut self, exit_code: i32) -> Result<()> {
        self.transition(if exit_code == 0 {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        })
    }
}

/// What the JVM is asked to start
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainTarget {
    /// `--module-path <classpath> -m <module>`
    Module(ModuleRef),
    /// `-jar <jar>`; the classpath is passed through the arguments
    Jar(PathBuf),
}

/// Everything needed to launch one task
///
/// Command line: `<launcher> <execution flags> <target> <args>`.
#[derive(Debug, Clone)]
pub struct TaskInvocation {
    pub name: String,
    pub classpath: Arc<Classpath>,
    pub launcher: Arc<Launcher>,
    pub main: MainTarget,
    pub args: Vec<OsString>,
    pub execution: Arc<ExecutionConfig>,
}

impl TaskInvocation {
    /// Arguments passed to the launcher, in order
    pub fn command_line(&self) -> Result<Vec<OsString>> {
        let mut line: Vec<OsString> = self
            .execution
            .jvm_args()
            .iter()
            .map(OsString::from)
            .collect();
        match &self.main {
            MainTarget::Module(module) => {
                line.push("--module-path".into());
                line.push(self.classpath.to_arg()?);
                line.push("-m".into());
                line.push(module.as_str().into());
            }
            MainTarget::Jar(jar) => {
                line.push("-jar".into());
                line.push(jar.clone().into_os_string());
            }
        }
        line.extend(self.args.iter().cloned());
        Ok(line)
    }

    pub fn to_command(&self) -> Result<Command> {
        let mut command = self.launcher.command();
        command.args(self.command_line()?);
        Ok(command)
    }

    /// Spawn with inherited stdio and wait for the exit code
    pub fn spawn_inherited(&self) -> Result<i32> {
        let mut command = self.to_command()?;
        tracing::info!("Launching task '{}': {:?}", self.name, command);
        let status = command.status().map_err(|source| HarnessError::Launch {
            program: self.launcher.program().display().to_string(),
            source,
        })?;
        Ok(exit_code_of(status))
    }
}

/// Exit code of a finished child; `128 + signal` when it was killed
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Exit status of a finished task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task: String,
    pub exit_code: i32,
}

impl TaskOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone)]
struct RunOutputs {
    classpath: Arc<Classpath>,
    launcher: Arc<Launcher>,
}

/// Starts the application module, like the `run` task of an application build
///
/// Once materialized it owns the runtime classpath and launcher that the
/// benchmark task borrows.
#[derive(Debug)]
pub struct RunTask {
    module: ModuleRef,
    execution: Arc<ExecutionConfig>,
    outputs: Option<RunOutputs>,
    lifecycle: TaskLifecycle,
}

impl RunTask {
    pub const NAME: &'static str = "run";

    /// Fails when the execution configuration was built for another module
    pub fn new(module: ModuleRef, execution: Arc<ExecutionConfig>) -> Result<Self> {
        execution.verify_for(&module)?;
        Ok(Self {
            module,
            execution,
            outputs: None,
            lifecycle: TaskLifecycle::new(Self::NAME),
        })
    }

    /// Fix the runtime classpath and launcher
    pub fn materialize(&mut self, classpath: Classpath, launcher: Arc<Launcher>) -> Result<()> {
        if classpath.is_empty() {
            return Err(HarnessError::Config(
                "runtime classpath is empty".to_string(),
            ));
        }
        self.lifecycle.transition(TaskState::Configured)?;
        self.outputs = Some(RunOutputs {
            classpath: Arc::new(classpath),
            launcher,
        });
        Ok(())
    }

    pub fn is_materialized(&self) -> bool {
        self.outputs.is_some()
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn execution(&self) -> &Arc<ExecutionConfig> {
        &self.execution
    }

    pub fn classpath(&self) -> Option<&Arc<Classpath>> {
        self.outputs.as_ref().map(|o| &o.classpath)
    }

    pub fn launcher(&self) -> Option<&Arc<Launcher>> {
        self.outputs.as_ref().map(|o| &o.launcher)
    }

    pub fn state(&self) -> TaskState {
        self.lifecycle.state()
    }

    pub fn invocation(&self, args: Vec<OsString>) -> Result<TaskInvocation> {
        let outputs = self
            .outputs
            .as_ref()
            .ok_or_else(|| HarnessError::RunTaskNotMaterialized {
                task: Self::NAME.to_string(),
            })?;
        Ok(TaskInvocation {
            name: Self::NAME.to_string(),
            classpath: Arc::clone(&outputs.classpath),
            launcher: Arc::clone(&outputs.launcher),
            main: MainTarget::Module(self.module.clone()),
            args,
            execution: Arc::clone(&self.execution),
        })
    }

    pub fn run(&mut self, args: Vec<OsString>) -> Result<TaskOutcome> {
        let invocation = self.invocation(args)?;
        self.lifecycle.transition(TaskState::Running)?;
        let exit_code = invocation.spawn_inherited()?;
        self.lifecycle.finish(exit_code)?;
        Ok(TaskOutcome {
            task: Self::NAME.to_string(),
            exit_code,
        })
    }
}

/// Runs the entry point with [`NO_TESTS_FLAG`]
///
/// Classpath and launcher are the run task's own `Arc`s, never rebuilt.
#[derive(Debug)]
pub struct BenchmarkTask {
    invocation: TaskInvocation,
    lifecycle: TaskLifecycle,
}

impl BenchmarkTask {
    pub const NAME: &'static str = "runBenchmarks";

    pub fn from_run_task(run: &RunTask) -> Result<Self> {
        let mut invocation = run
            .invocation(vec![OsString::from(NO_TESTS_FLAG)])
            .map_err(|e| match e {
                HarnessError::RunTaskNotMaterialized { .. } => {
                    HarnessError::RunTaskNotMaterialized {
                        task: Self::NAME.to_string(),
                    }
                }
                other => other,
            })?;
        invocation.name = Self::NAME.to_string();

        let mut lifecycle = TaskLifecycle::new(Self::NAME);
        lifecycle.transition(TaskState::Configured)?;
        Ok(Self {
            invocation,
            lifecycle,
        })
    }

    pub fn invocation(&self) -> &TaskInvocation {
        &self.invocation
    }

    pub fn state(&self) -> TaskState {
        self.lifecycle.state()
    }

    /// Run the benchmarks; output is the entry point's own
    pub fn run(&mut self) -> Result<TaskOutcome> {
        self.lifecycle.transition(TaskState::Running)?;
        let exit_code = self.invocation.spawn_inherited()?;
        self.lifecycle.finish(exit_code)?;
        Ok(TaskOutcome {
            task: Self::NAME.to_string(),
            exit_code,
        })
    }
}
