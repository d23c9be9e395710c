// Dependency resolution for the application module
//
// The harness consumes resolution only at its boundary: a coordinate goes in,
// a local jar path comes out, or startup aborts naming the coordinate.
//
// - `RepositoryResolver` walks Maven-layout repositories in declaration order
//   and picks the highest version accepted by the selector.
// - `CachingResolver` keeps a coordinate-keyed index with resolution
//   timestamps. Changing coordinates are re-checked once older than the
//   freshness window (one hour by default); everything else is reused.
//
// Neither layer retries. A failed lookup is reported as-is.

mod cache;
mod caching;
mod coordinate;
mod repository;
mod version;

pub use cache::{CacheEntry, ResolutionCache, CACHE_INDEX_FILE};
pub use caching::{CachePolicy, CachingResolver, Clock, ManualClock, SystemClock};
pub use coordinate::Coordinate;
pub use repository::{parse_metadata_versions, parse_snapshot_jar_version, HttpClient, Repository};
pub use version::{compare_versions, is_snapshot, select_version, VersionSelector};

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors surfaced by a [`Resolver`]
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid coordinate '{notation}': {reason}")]
    InvalidCoordinate { notation: String, reason: String },

    #[error("no version of {coordinate} found in {}", .searched.join(", "))]
    NoMatchingVersion {
        coordinate: String,
        searched: Vec<String>,
    },

    #[error("{coordinate} not found in {}", .searched.join(", "))]
    NotFound {
        coordinate: String,
        searched: Vec<String>,
    },

    #[error("offline and no cached resolution for {0}")]
    Offline(String),

    #[error("HTTP error fetching {url}: {reason}")]
    Http { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A coordinate resolved to a concrete local file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedArtifact {
    /// The coordinate as requested (`group:name:selector`)
    pub coordinate: String,
    /// The concrete version chosen
    pub version: String,
    pub path: PathBuf,
    /// Name of the repository that supplied the artifact
    pub repository: String,
    /// Hex SHA-256 of the file at resolution time
    pub sha256: String,
}

/// Resolve coordinates to local artifacts
pub trait Resolver {
    fn resolve(&mut self, coordinate: &Coordinate) -> Result<ResolvedArtifact, ResolveError>;
}

/// Hex SHA-256 of a file's contents
pub fn digest_file(path: &Path) -> std::io::Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Resolves against repositories in declaration order
pub struct RepositoryResolver {
    repositories: Vec<Repository>,
    cache_dir: PathBuf,
    client: HttpClient,
}

impl RepositoryResolver {
    /// `cache_dir` receives artifacts downloaded from HTTP repositories
    pub fn new(repositories: Vec<Repository>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            repositories,
            cache_dir: cache_dir.into(),
            client: HttpClient::new(),
        }
    }

    fn searched(&self) -> Vec<String> {
        self.repositories.iter().map(|r| r.name().to_string()).collect()
    }

    /// Pick the concrete version for a dynamic selector across all repositories
    fn select_dynamic(&self, coordinate: &Coordinate) -> Result<String, ResolveError> {
        let mut candidates = Vec::new();
        for repository in &self.repositories {
            let versions = repository.list_versions(coordinate, &self.client)?;
            tracing::trace!(
                "{} lists {} version(s) of {}",
                repository.name(),
                versions.len(),
                coordinate
            );
            candidates.extend(versions);
        }
        select_version(candidates.iter().map(String::as_str), &coordinate.selector)
            .map(str::to_string)
            .ok_or_else(|| ResolveError::NoMatchingVersion {
                coordinate: coordinate.to_string(),
                searched: self.searched(),
            })
    }
}

impl Resolver for RepositoryResolver {
    fn resolve(&mut self, coordinate: &Coordinate) -> Result<ResolvedArtifact, ResolveError> {
        let version = match &coordinate.selector {
            VersionSelector::Exact(version) => version.clone(),
            _ => self.select_dynamic(coordinate)?,
        };

        for repository in &self.repositories {
            if let Some(path) =
                repository.fetch(coordinate, &version, &self.cache_dir, &self.client)?
            {
                let sha256 = digest_file(&path)?;
                return Ok(ResolvedArtifact {
                    coordinate: coordinate.to_string(),
                    version,
                    path,
                    repository: repository.name().to_string(),
                    sha256,
                });
            }
        }

        Err(ResolveError::NotFound {
            coordinate: format!("{} ({})", coordinate, version),
            searched: self.searched(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publish(root: &Path, coordinate: &Coordinate, version: &str) {
        let dir = root.join(coordinate.artifact_dir()).join(version);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(coordinate.jar_name(version)), version.as_bytes()).unwrap();
    }

    fn directory(name: &str, root: &Path) -> Repository {
        Repository::Directory {
            name: name.to_string(),
            root: root.to_path_buf(),
        }
    }

    #[test]
    fn test_digest_file_known_value() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            digest_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_latest_across_repositories() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        let coordinate = Coordinate::parse("syspro.tm:RegexApp:+").unwrap();
        publish(first.path(), &coordinate, "1.0");
        publish(second.path(), &coordinate, "1.3");

        let mut resolver = RepositoryResolver::new(
            vec![directory("first", first.path()), directory("second", second.path())],
            first.path().join("cache"),
        );
        let artifact = resolver.resolve(&coordinate).unwrap();
        assert_eq!(artifact.version, "1.3");
        assert_eq!(artifact.repository, "second");
        assert_eq!(artifact.sha256, digest_file(&artifact.path).unwrap());
    }

    #[test]
    fn test_exact_version_first_repository_wins() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        let coordinate = Coordinate::parse("a.b:c:2.0").unwrap();
        publish(first.path(), &coordinate, "2.0");
        publish(second.path(), &coordinate, "2.0");

        let mut resolver = RepositoryResolver::new(
            vec![directory("first", first.path()), directory("second", second.path())],
            first.path().join("cache"),
        );
        assert_eq!(resolver.resolve(&coordinate).unwrap().repository, "first");
    }

    #[test]
    fn test_unresolvable_names_coordinate() {
        let empty = tempfile::TempDir::new().unwrap();
        let mut resolver =
            RepositoryResolver::new(vec![directory("empty", empty.path())], empty.path());

        let dynamic = Coordinate::parse("syspro.tm:RegexApp:+").unwrap();
        let err = resolver.resolve(&dynamic).unwrap_err();
        assert!(matches!(err, ResolveError::NoMatchingVersion { .. }));
        assert!(err.to_string().contains("syspro.tm:RegexApp:+"));
        assert!(err.to_string().contains("empty"));

        let exact = Coordinate::parse("syspro.tm:RegexApp:9.9").unwrap();
        assert!(matches!(
            resolver.resolve(&exact),
            Err(ResolveError::NotFound { .. })
        ));
    }
}
