// Execution model shared by run, test, and benchmark tasks
//
// One `ExecutionConfig` is built at startup and handed to every task as an
// `Arc`. The run task owns the runtime classpath and launcher once
// materialized; the benchmark task clones those `Arc`s instead of rebuilding
// them.

mod classpath;
mod launcher;
mod task;

pub use classpath::Classpath;
pub use launcher::{parse_java_major_version, Launcher};
pub use task::{
    exit_code_of, BenchmarkTask, MainTarget, RunTask, TaskInvocation, TaskLifecycle, TaskOutcome,
    TaskState, NO_TESTS_FLAG,
};

use crate::config::ExecutionSettings;
use crate::error::{HarnessError, Result};
use crate::module::{check_grants, ModuleRef, NativeAccessGrant};

/// JVM flags applied identically to every task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    module: ModuleRef,
    jvm_args: Vec<String>,
}

impl ExecutionConfig {
    /// Build the flag list for `module`
    ///
    /// The native-access grant comes first when enabled, followed by the
    /// configured extra arguments. Any grant among the extras must name
    /// exactly `module`.
    pub fn new(module: &ModuleRef, settings: &ExecutionSettings) -> Result<Self> {
        check_grants(module, &settings.jvm_args)?;

        let mut jvm_args = Vec::with_capacity(settings.jvm_args.len() + 1);
        if settings.enable_native_access {
            jvm_args.push(module.native_access_grant().to_flag());
        }
        for arg in &settings.jvm_args {
            if !jvm_args.contains(arg) {
                jvm_args.push(arg.clone());
            }
        }
        tracing::debug!("Execution flags for {}: {:?}", module, jvm_args);

        Ok(Self {
            module: module.clone(),
            jvm_args,
        })
    }

    pub fn module(&self) -> &ModuleRef {
        &self.module
    }

    pub fn jvm_args(&self) -> &[String] {
        &self.jvm_args
    }

    /// True when a grant for the module is part of the flags
    pub fn grants_native_access(&self) -> bool {
        self.jvm_args
            .iter()
            .filter_map(|arg| NativeAccessGrant::parse(arg))
            .any(|grant| grant.names_exactly(&self.module))
    }

    /// Reject use with an entry module other than the one the flags were built for
    pub fn verify_for(&self, module: &ModuleRef) -> Result<()> {
        if &self.module != module {
            return Err(HarnessError::ModuleMismatch {
                expected: module.to_string(),
                found: self.module.to_string(),
            });
        }
        check_grants(module, &self.jvm_args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> ModuleRef {
        ModuleRef::new("syspro.tm.RegexApp").unwrap()
    }

    #[test]
    fn test_default_settings_grant_module() {
        let config = ExecutionConfig::new(&module(), &ExecutionSettings::default()).unwrap();
        assert_eq!(
            config.jvm_args(),
            &["--enable-native-access=syspro.tm.RegexApp".to_string()]
        );
        assert!(config.grants_native_access());
        assert!(config.verify_for(&module()).is_ok());
    }

    #[test]
    fn test_disabled_grant_and_extra_args() {
        let settings = ExecutionSettings {
            enable_native_access: false,
            jvm_args: vec!["-Xmx512m".to_string()],
        };
        let config = ExecutionConfig::new(&module(), &settings).unwrap();
        assert_eq!(config.jvm_args(), &["-Xmx512m".to_string()]);
        assert!(!config.grants_native_access());
    }

    #[test]
    fn test_duplicate_grant_collapsed() {
        let settings = ExecutionSettings {
            enable_native_access: true,
            jvm_args: vec!["--enable-native-access=syspro.tm.RegexApp".to_string()],
        };
        let config = ExecutionConfig::new(&module(), &settings).unwrap();
        assert_eq!(config.jvm_args().len(), 1);
    }

    #[test]
    fn test_mismatched_extra_grant_rejected() {
        let settings = ExecutionSettings {
            enable_native_access: true,
            jvm_args: vec!["--enable-native-access=syspro.tm.Other".to_string()],
        };
        assert!(matches!(
            ExecutionConfig::new(&module(), &settings),
            Err(HarnessError::ModuleMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_for_other_module_rejected() {
        let config = ExecutionConfig::new(&module(), &ExecutionSettings::default()).unwrap();
        let renamed = ModuleRef::new("syspro.tm.Renamed").unwrap();
        match config.verify_for(&renamed) {
            Err(HarnessError::ModuleMismatch { expected, found }) => {
                assert_eq!(expected, "syspro.tm.Renamed");
                assert_eq!(found, "syspro.tm.RegexApp");
            }
            other => panic!("Expected ModuleMismatch, got {:?}", other),
        }
    }
}
