use std::fmt;

use serde::{Deserialize, Serialize};

use super::version::{is_snapshot, VersionSelector};
use super::ResolveError;

/// An artifact coordinate: `group:name:selector` plus the changing flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub group: String,
    pub name: String,
    pub selector: VersionSelector,
    /// Content may change under the same version; cached only for a bounded window
    pub changing: bool,
}

impl Coordinate {
    /// Parse `group:name:selector`
    ///
    /// Snapshot versions (`-SNAPSHOT` suffix) are changing by default.
    pub fn parse(notation: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::InvalidCoordinate {
            notation: notation.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = notation.trim().split(':').collect();
        let [group, name, selector] = parts.as_slice() else {
            return Err(invalid("expected group:name:version"));
        };

        for (label, value) in [("group", group), ("name", name)] {
            if value.is_empty() {
                return Err(invalid(&format!("{} is empty", label)));
            }
            if value.contains(['/', '\\']) || value.split('.').any(|p| p.is_empty() || p == "..")
            {
                return Err(invalid(&format!("{} '{}' is not a valid path segment", label, value)));
            }
        }

        let selector = VersionSelector::parse(selector).map_err(|reason| invalid(&reason))?;
        let changing = matches!(&selector, VersionSelector::Exact(v) if is_snapshot(v));

        Ok(Self {
            group: group.to_string(),
            name: name.to_string(),
            selector,
            changing,
        })
    }

    pub fn with_changing(mut self, changing: bool) -> Self {
        self.changing = changing;
        self
    }

    /// Key of this coordinate in the resolution cache
    pub fn cache_key(&self) -> String {
        self.to_string()
    }

    /// Maven repository path of the group (`syspro.tm` → `syspro/tm`)
    pub fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }

    /// Repository-relative directory holding all versions of this artifact
    pub fn artifact_dir(&self) -> String {
        format!("{}/{}", self.group_path(), self.name)
    }

    /// Jar file name for a concrete version
    pub fn jar_name(&self, version: &str) -> String {
        format!("{}-{}.jar", self.name, version)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.selector)
    }
}
