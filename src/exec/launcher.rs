use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::JavaConfig;
use crate::error::{HarnessError, Result};

/// The `java` executable shared by every task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    program: PathBuf,
}

impl Launcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Launcher inside a JDK home
    pub fn from_java_home(home: &Path) -> Self {
        let exe = if cfg!(windows) { "java.exe" } else { "java" };
        Self::new(home.join("bin").join(exe))
    }

    /// Select the launcher: configured home, then `JAVA_HOME`, then `java` on `PATH`
    pub fn select(config: &JavaConfig) -> Self {
        if let Some(home) = &config.home {
            tracing::debug!("Using configured JDK home {}", home.display());
            return Self::from_java_home(home);
        }
        if let Some(home) = env::var_os("JAVA_HOME").filter(|h| !h.is_empty()) {
            tracing::debug!("Using JAVA_HOME {}", Path::new(&home).display());
            return Self::from_java_home(Path::new(&home));
        }
        Self::new("java")
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn command(&self) -> Command {
        Command::new(&self.program)
    }

    /// Major version reported by `java -version`
    pub fn probe_major_version(&self) -> Result<u32> {
        let output = self
            .command()
            .arg("-version")
            .output()
            .map_err(|source| HarnessError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;
        // The banner goes to stderr on every JDK, but be lenient
        let mut banner = String::from_utf8_lossy(&output.stderr).into_owned();
        banner.push_str(&String::from_utf8_lossy(&output.stdout));
        parse_java_major_version(&banner).ok_or_else(|| {
            HarnessError::Config(format!(
                "cannot determine Java version of {} from: {}",
                self.program.display(),
                banner.trim()
            ))
        })
    }

    /// Fail unless the launcher runs the required language version
    pub fn verify_language_version(&self, required: u32) -> Result<()> {
        let actual = self.probe_major_version()?;
        if actual != required {
            return Err(HarnessError::Config(format!(
                "{} is Java {}, but Java {} is required",
                self.program.display(),
                actual,
                required
            )));
        }
        tracing::debug!("{} is Java {}", self.program.display(), actual);
        Ok(())
    }
}

fn version_banner() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"version "(\d+)(?:\.(\d+))?"#).expect("version banner regex should compile")
    })
}

/// Major version from a `java -version` banner (`1.8.0_392` is 8)
pub fn parse_java_major_version(banner: &str) -> Option<u32> {
    let captures = version_banner().captures(banner)?;
    let first: u32 = captures[1].parse().ok()?;
    if first == 1 {
        captures.get(2)?.as_str().parse().ok()
    } else {
        Some(first)
    }
}
