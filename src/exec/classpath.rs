use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{HarnessError, Result};

/// Ordered list of class directories and jars
///
/// Rendered with the platform path separator for `--module-path` or
/// `--class-path`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, skipping duplicates
    pub fn push(&mut self, entry: impl Into<PathBuf>) {
        let entry = entry.into();
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    pub fn with(mut self, entries: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        for entry in entries {
            self.push(entry);
        }
        self
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Join entries with the platform separator
    pub fn to_arg(&self) -> Result<OsString> {
        env::join_paths(&self.entries).map_err(|e| {
            HarnessError::Config(format!("classpath entry cannot be joined: {}", e))
        })
    }
}
