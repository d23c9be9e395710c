//! Startup wiring: configuration, resolution, launcher, and task construction
//!
//! [`Harness::configure`] does every blocking setup step up front. When it
//! returns, the dependency is resolved, the launcher is selected, and the
//! shared execution flags are fixed; the task methods only assemble and launch.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::exec::{BenchmarkTask, Classpath, ExecutionConfig, Launcher, RunTask, TaskOutcome};
use crate::module::ModuleRef;
use crate::resolver::{
    CachePolicy, CachingResolver, Coordinate, Repository, RepositoryResolver, ResolutionCache,
    ResolvedArtifact, Resolver,
};
use crate::testing::{TestOptions, TestReport, TestReporter, TestTask};

/// Process-level switches that are not part of the configuration file
#[derive(Debug, Clone)]
pub struct HarnessOptions {
    pub project_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub offline: bool,
    pub refresh_dependencies: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            config: None,
            offline: false,
            refresh_dependencies: false,
        }
    }
}

/// A configured harness, ready to build tasks
pub struct Harness {
    config: HarnessConfig,
    module: ModuleRef,
    execution: Arc<ExecutionConfig>,
    launcher: Arc<Launcher>,
    resolver: CachingResolver<RepositoryResolver>,
    dependency: ResolvedArtifact,
}

impl Harness {
    /// Load configuration, resolve the dependency, and select the launcher
    ///
    /// Any failure here is a setup failure; no task has started.
    pub fn configure(options: &HarnessOptions) -> Result<Self> {
        let config = HarnessConfig::load(&options.project_dir, options.config.as_deref())?;
        config.validate()?;
        tracing::info!(
            "Configuring {}:{} (entry module {})",
            config.project.group,
            config.project.version,
            config.application.main_module
        );

        let module = config.main_module()?;
        let execution = Arc::new(ExecutionConfig::new(&module, &config.execution)?);

        let mut resolver = build_resolver(&config, &options.project_dir, options);
        let dependency = resolve(&mut resolver, &config.dependency()?)?;

        let launcher = Launcher::select(&config.java);
        if config.java.check_version {
            launcher.verify_language_version(config.java.language_version)?;
        }

        Ok(Self {
            config,
            module,
            execution,
            launcher: Arc::new(launcher),
            resolver,
            dependency,
        })
    }

    pub fn execution(&self) -> &Arc<ExecutionConfig> {
        &self.execution
    }

    pub fn dependency(&self) -> &ResolvedArtifact {
        &self.dependency
    }

    /// Main class directories (those that exist) followed by the dependency jar
    pub fn runtime_classpath(&self) -> Classpath {
        existing_dirs(&self.config.project.classes).with([self.dependency.path.clone()])
    }

    /// The materialized run task
    pub fn run_task(&self) -> Result<RunTask> {
        let mut task = RunTask::new(self.module.clone(), Arc::clone(&self.execution))?;
        task.materialize(self.runtime_classpath(), Arc::clone(&self.launcher))?;
        Ok(task)
    }

    pub fn run(&self, args: Vec<String>) -> Result<TaskOutcome> {
        let args = args.into_iter().map(OsString::from).collect();
        Ok(self.run_task()?.run(args)?)
    }

    pub fn benchmark_task(&self) -> Result<BenchmarkTask> {
        let run = self.run_task()?;
        Ok(BenchmarkTask::from_run_task(&run)?)
    }

    pub fn run_benchmarks(&self) -> Result<TaskOutcome> {
        Ok(self.benchmark_task()?.run()?)
    }

    /// Resolve the console launcher and build the test task
    pub fn test_task(&mut self, options: &TestOptions) -> Result<TestTask> {
        let console = resolve(&mut self.resolver, &self.config.test_launcher()?)?;
        let test_dirs = existing_dirs(&self.config.test.classes);
        let classpath = test_dirs
            .clone()
            .with(self.runtime_classpath().entries().iter().cloned());
        Ok(TestTask::new(
            console.path,
            &test_dirs,
            classpath,
            Arc::clone(&self.launcher),
            Arc::clone(&self.execution),
            options,
        )?)
    }

    pub fn test(
        &mut self,
        options: &TestOptions,
        reporter: &mut dyn TestReporter,
    ) -> Result<TestReport> {
        let mut task = self.test_task(options)?;
        Ok(task.run(reporter)?)
    }
}

fn build_resolver(
    config: &HarnessConfig,
    project_dir: &Path,
    options: &HarnessOptions,
) -> CachingResolver<RepositoryResolver> {
    let repositories = config
        .repositories
        .iter()
        .map(|r| Repository::from_config(r, project_dir))
        .collect();
    let policy = CachePolicy {
        changing_window: Duration::from_secs(config.cache.changing_modules_for_secs),
        dynamic_window: Duration::from_secs(config.cache.dynamic_versions_for_secs),
        offline: options.offline,
        refresh: options.refresh_dependencies,
    };
    CachingResolver::new(
        RepositoryResolver::new(repositories, &config.cache.dir),
        ResolutionCache::load(&config.cache.dir),
        policy,
    )
}

fn resolve<R: Resolver>(
    resolver: &mut R,
    coordinate: &Coordinate,
) -> std::result::Result<ResolvedArtifact, HarnessError> {
    resolver
        .resolve(coordinate)
        .map_err(|e| HarnessError::Resolution {
            coordinate: coordinate.to_string(),
            reason: e.to_string(),
        })
}

fn existing_dirs(dirs: &[PathBuf]) -> Classpath {
    let mut classpath = Classpath::new();
    for dir in dirs {
        if dir.exists() {
            classpath.push(dir.clone());
        } else {
            tracing::debug!("Skipping missing class directory {}", dir.display());
        }
    }
    classpath
}
