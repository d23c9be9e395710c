//! Harness configuration loaded from `harness.toml`
//!
//! Every field has a default matching the RegexApp build: module
//! `syspro.tm.RegexApp`, the changing dependency `syspro.tm:RegexApp:+`
//! re-checked after one hour, Java 25, and native access granted to the
//! module on every run, test, and benchmark.
//!
//! # Example TOML
//! ```toml
//! [application]
//! main_module = "syspro.tm.RegexApp"
//!
//! [dependency]
//! coordinate = "syspro.tm:RegexApp:+"
//! changing = true
//!
//! [[repository]]
//! name = "local"
//! url = "/srv/maven"
//!
//! [cache]
//! changing_modules_for_secs = 3600
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::HarnessError;
use crate::module::{check_grants, ModuleRef};
use crate::resolver::Coordinate;

/// Name of the configuration file looked up in the project directory
pub const CONFIG_FILE_NAME: &str = "harness.toml";

/// Maven Central, searched first by default
pub const MAVEN_CENTRAL_URL: &str = "https://repo.maven.apache.org/maven2";

/// Repository publishing the RegexApp module
pub const SYSPRO_REPOSITORY_URL: &str = "https://sysprolang.b-andrew.ru/repository";

/// Top-level harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub project: ProjectConfig,
    pub application: ApplicationConfig,
    pub dependency: DependencyConfig,
    #[serde(rename = "repository")]
    pub repositories: Vec<RepositoryConfig>,
    pub cache: CacheConfig,
    pub java: JavaConfig,
    pub execution: ExecutionSettings,
    pub test: TestConfig,
}

/// Identity and compiled outputs of the project under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub group: String,
    pub version: String,
    /// Compiled main class directories, placed ahead of resolved artifacts
    pub classes: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplicationConfig {
    /// Module holding the entry point; also the native-access grantee
    pub main_module: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DependencyConfig {
    /// `group:name:selector`, where selector is exact, `+`, or `prefix.+`
    pub coordinate: String,
    /// Content may change without a version bump (snapshot-like)
    pub changing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub name: String,
    /// `http(s)://` URL, `file://` URL, or filesystem path
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Cache root (resolution index plus downloaded artifacts)
    pub dir: PathBuf,
    /// Freshness window for changing coordinates
    pub changing_modules_for_secs: u64,
    /// Freshness window for dynamic selectors on non-changing coordinates
    pub dynamic_versions_for_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JavaConfig {
    /// JDK home; falls back to `JAVA_HOME`, then `java` on `PATH`
    pub home: Option<PathBuf>,
    /// Required major version of the selected launcher
    pub language_version: u32,
    /// Probe `java -version` and reject a mismatching launcher
    pub check_version: bool,
}

/// JVM flags applied identically to run, test, and benchmark invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSettings {
    pub enable_native_access: bool,
    pub jvm_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    /// Coordinate of the JUnit Platform console launcher
    pub launcher: String,
    /// Compiled test class directories; scanned for tests
    pub classes: Vec<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            application: ApplicationConfig::default(),
            dependency: DependencyConfig::default(),
            repositories: vec![
                RepositoryConfig {
                    name: "mavenCentral".to_string(),
                    url: MAVEN_CENTRAL_URL.to_string(),
                },
                RepositoryConfig {
                    name: "syspro".to_string(),
                    url: SYSPRO_REPOSITORY_URL.to_string(),
                },
            ],
            cache: CacheConfig::default(),
            java: JavaConfig::default(),
            execution: ExecutionSettings::default(),
            test: TestConfig::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            group: "syspro.tm.implementation".to_string(),
            version: "1.0-SNAPSHOT".to_string(),
            classes: vec![PathBuf::from("build/classes/java/main")],
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            main_module: "syspro.tm.RegexApp".to_string(),
        }
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            coordinate: "syspro.tm:RegexApp:+".to_string(),
            changing: true,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".harness/cache"),
            changing_modules_for_secs: 60 * 60,
            dynamic_versions_for_secs: 24 * 60 * 60,
        }
    }
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            home: None,
            language_version: 25,
            check_version: true,
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            enable_native_access: true,
            jvm_args: Vec::new(),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            launcher: "org.junit.platform:junit-platform-console-standalone:1.14.1".to_string(),
            classes: vec![PathBuf::from("build/classes/java/test")],
        }
    }
}

impl HarnessConfig {
    /// Parse a configuration file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))
    }

    /// Load the configuration for a project
    ///
    /// An explicit path must exist. Otherwise `harness.toml` in the project
    /// directory is used when present, and the defaults when it is not.
    /// Relative paths in the result are anchored at `project_dir`.
    pub fn load(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_toml(path)?,
            None => {
                let candidate = project_dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_toml(&candidate)?
                } else {
                    tracing::debug!(
                        "No {} in {}, using defaults",
                        CONFIG_FILE_NAME,
                        project_dir.display()
                    );
                    Self::default()
                }
            }
        };
        config.anchor_paths(project_dir);
        Ok(config)
    }

    fn anchor_paths(&mut self, project_dir: &Path) {
        let anchor = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = project_dir.join(&*p);
            }
        };
        for dir in self.project.classes.iter_mut().chain(self.test.classes.iter_mut()) {
            anchor(dir);
        }
        anchor(&mut self.cache.dir);
        if let Some(home) = self.java.home.as_mut() {
            anchor(home);
        }
    }

    /// The entry module
    pub fn main_module(&self) -> std::result::Result<ModuleRef, HarnessError> {
        ModuleRef::new(self.application.main_module.clone())
    }

    /// The application dependency, with its changing flag applied
    pub fn dependency(&self) -> std::result::Result<Coordinate, HarnessError> {
        let coordinate = Coordinate::parse(&self.dependency.coordinate)
            .map_err(|e| HarnessError::Config(e.to_string()))?;
        Ok(coordinate.with_changing(self.dependency.changing))
    }

    /// The console launcher coordinate (never changing)
    pub fn test_launcher(&self) -> std::result::Result<Coordinate, HarnessError> {
        Coordinate::parse(&self.test.launcher).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Validate configuration
    ///
    /// Checks the module name, both coordinates, the repository list, and
    /// that any native-access grant in `jvm_args` names the entry module.
    pub fn validate(&self) -> std::result::Result<(), HarnessError> {
        let module = self.main_module()?;
        self.dependency()?;
        self.test_launcher()?;

        if self.repositories.is_empty() {
            return Err(HarnessError::Config(
                "at least one [[repository]] is required".to_string(),
            ));
        }
        for repository in &self.repositories {
            if repository.url.trim().is_empty() {
                return Err(HarnessError::Config(format!(
                    "repository '{}' has an empty url",
                    repository.name
                )));
            }
        }

        check_grants(&module, &self.execution.jvm_args)?;
        Ok(())
    }
}
