//! Module identity and the native-access grant derived from it
//!
//! The entry module is named twice on every command line: once as the
//! `-m` target and once inside `--enable-native-access=<module>`. Both must
//! name the same module, which [`check_grants`] enforces before launch.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// JVM option that grants native access to a list of modules
pub const NATIVE_ACCESS_OPTION: &str = "--enable-native-access";

/// A validated Java module name (e.g. `syspro.tm.RegexApp`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModuleRef(String);

impl ModuleRef {
    /// Validate and wrap a module name
    ///
    /// A module name is one or more dot-separated Java identifiers.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(HarnessError::Config("module name is empty".to_string()));
        }
        for part in name.split('.') {
            if !is_java_identifier(part) {
                return Err(HarnessError::Config(format!(
                    "'{}' is not a valid module name (bad component '{}')",
                    name, part
                )));
            }
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The grant that enables native access for exactly this module
    pub fn native_access_grant(&self) -> NativeAccessGrant {
        NativeAccessGrant {
            modules: vec![self.0.clone()],
        }
    }
}

fn is_java_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModuleRef {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ModuleRef {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ModuleRef> for String {
    fn from(module: ModuleRef) -> Self {
        module.0
    }
}

/// A parsed `--enable-native-access=<m1>,<m2>,...` option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeAccessGrant {
    modules: Vec<String>,
}

impl NativeAccessGrant {
    /// Parse a JVM argument; `None` when it is not a native-access option
    pub fn parse(arg: &str) -> Option<Self> {
        let value = arg
            .strip_prefix(NATIVE_ACCESS_OPTION)?
            .strip_prefix('=')?;
        let modules = value
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        Some(Self { modules })
    }

    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// True when the grant names this module and nothing else
    pub fn names_exactly(&self, module: &ModuleRef) -> bool {
        self.modules.len() == 1 && self.modules[0] == module.as_str()
    }

    pub fn to_flag(&self) -> String {
        format!("{}={}", NATIVE_ACCESS_OPTION, self.modules.join(","))
    }
}

impl fmt::Display for NativeAccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_flag())
    }
}

/// Reject any native-access option in `jvm_args` that does not name exactly `module`
pub fn check_grants(module: &ModuleRef, jvm_args: &[String]) -> Result<()> {
    for arg in jvm_args {
        if let Some(grant) = NativeAccessGrant::parse(arg) {
            if !grant.names_exactly(module) {
                return Err(HarnessError::ModuleMismatch {
                    expected: module.to_string(),
                    found: grant.modules().join(","),
                });
            }
        }
    }
    Ok(())
}
