//! Error taxonomy for the harness
//!
//! Setup problems (configuration, resolution, launcher selection) abort before
//! any task runs and map to [`EXIT_SETUP_FAILURE`]. Test failures are not
//! errors: they are outcomes reported with [`EXIT_TEST_FAILURE`].

use thiserror::Error;

use crate::exec::TaskState;

/// Exit code when one or more tests (or test containers) failed
pub const EXIT_TEST_FAILURE: i32 = 1;

/// Exit code when the harness could not reach the point of running a task
pub const EXIT_SETUP_FAILURE: i32 = 2;

/// Errors raised while configuring or launching a task
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("native-access grant names module '{found}' but the entry module is '{expected}'")]
    ModuleMismatch { expected: String, found: String },

    #[error("could not resolve {coordinate}: {reason}")]
    Resolution { coordinate: String, reason: String },

    #[error("task '{task}' requires the run task's classpath and launcher, which are not materialized yet")]
    RunTaskNotMaterialized { task: String },

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task '{task}' cannot move from {from} to {to}")]
    State {
        task: String,
        from: TaskState,
        to: TaskState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Process exit code for this error
    ///
    /// Every variant is raised before or instead of a task's own result, so
    /// all of them are setup failures.
    pub fn exit_code(&self) -> i32 {
        EXIT_SETUP_FAILURE
    }
}

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;
