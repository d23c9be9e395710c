//! Maven-layout repositories
//!
//! A repository is either a directory (`/srv/maven`, `file:///srv/maven`) or
//! an HTTP base URL. Both use the Maven layout:
//! `<group path>/<name>/<version>/<name>-<version>.jar`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use super::version::is_snapshot;
use super::{Coordinate, ResolveError};
use crate::config::RepositoryConfig;

/// Where artifacts are looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    Directory { name: String, root: PathBuf },
    Http { name: String, base_url: String },
}

impl Repository {
    /// Build a repository from its configuration
    ///
    /// Relative directory paths are anchored at `base_dir`.
    pub fn from_config(config: &RepositoryConfig, base_dir: &Path) -> Self {
        let url = config.url.trim();
        if url.starts_with("http://") || url.starts_with("https://") {
            return Self::Http {
                name: config.name.clone(),
                base_url: url.trim_end_matches('/').to_string(),
            };
        }
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        let root = if path.is_relative() {
            base_dir.join(path)
        } else {
            path
        };
        Self::Directory {
            name: config.name.clone(),
            root,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Directory { name, .. } | Self::Http { name, .. } => name,
        }
    }

    /// All versions this repository publishes for the coordinate
    pub fn list_versions(
        &self,
        coordinate: &Coordinate,
        client: &HttpClient,
    ) -> Result<Vec<String>, ResolveError> {
        match self {
            Self::Directory { root, .. } => {
                let dir = root.join(coordinate.artifact_dir());
                let entries = match fs::read_dir(&dir) {
                    Ok(entries) => entries,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
                    Err(e) => return Err(e.into()),
                };
                let mut versions = Vec::new();
                for entry in entries.flatten() {
                    let Some(version) = entry.file_name().to_str().map(str::to_string) else {
                        continue;
                    };
                    if entry.path().join(coordinate.jar_name(&version)).is_file() {
                        versions.push(version);
                    }
                }
                versions.sort();
                Ok(versions)
            }
            Self::Http { base_url, .. } => {
                let url = format!("{}/{}/maven-metadata.xml", base_url, coordinate.artifact_dir());
                match client.get_text(&url)? {
                    Some(xml) => Ok(parse_metadata_versions(&xml)),
                    None => Ok(Vec::new()),
                }
            }
        }
    }

    /// Local path of the jar for a concrete version, downloading it when remote
    ///
    /// Returns `Ok(None)` when this repository does not have the version.
    pub fn fetch(
        &self,
        coordinate: &Coordinate,
        version: &str,
        cache_dir: &Path,
        client: &HttpClient,
    ) -> Result<Option<PathBuf>, ResolveError> {
        match self {
            Self::Directory { root, .. } => {
                let jar = root
                    .join(coordinate.artifact_dir())
                    .join(version)
                    .join(coordinate.jar_name(version));
                Ok(jar.is_file().then_some(jar))
            }
            Self::Http { base_url, .. } => {
                let version_url = format!("{}/{}/{}", base_url, coordinate.artifact_dir(), version);

                // Remote snapshots are published under timestamped file names
                let file_version = if is_snapshot(version) {
                    client
                        .get_text(&format!("{}/maven-metadata.xml", version_url))?
                        .and_then(|xml| parse_snapshot_jar_version(&xml))
                        .unwrap_or_else(|| version.to_string())
                } else {
                    version.to_string()
                };

                let url = format!("{}/{}", version_url, coordinate.jar_name(&file_version));
                let Some(bytes) = client.get_bytes(&url)? else {
                    return Ok(None);
                };

                let target_dir = cache_dir
                    .join("artifacts")
                    .join(coordinate.artifact_dir())
                    .join(version);
                fs::create_dir_all(&target_dir)?;
                let target = target_dir.join(coordinate.jar_name(version));
                let partial = target.with_extension("jar.part");
                {
                    let mut file = fs::File::create(&partial)?;
                    file.write_all(&bytes)?;
                    file.sync_all()?;
                }
                fs::rename(&partial, &target)?;
                tracing::debug!("Downloaded {} to {}", url, target.display());
                Ok(Some(target))
            }
        }
    }
}

/// Lazily built blocking HTTP client
///
/// Directory-only configurations never construct the underlying client.
#[derive(Default)]
pub struct HttpClient {
    inner: OnceLock<reqwest::blocking::Client>,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, ResolveError> {
        if let Some(client) = self.inner.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("regex-harness/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ResolveError::Http {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(self.inner.get_or_init(|| client))
    }

    fn get(&self, url: &str) -> Result<Option<reqwest::blocking::Response>, ResolveError> {
        let http_error = |reason: String| ResolveError::Http {
            url: url.to_string(),
            reason,
        };
        tracing::debug!("GET {}", url);
        let response = self
            .client()?
            .get(url)
            .send()
            .map_err(|e| http_error(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(http_error(format!("status {}", response.status())));
        }
        Ok(Some(response))
    }

    fn get_text(&self, url: &str) -> Result<Option<String>, ResolveError> {
        match self.get(url)? {
            Some(response) => response.text().map(Some).map_err(|e| ResolveError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            None => Ok(None),
        }
    }

    fn get_bytes(&self, url: &str) -> Result<Option<Vec<u8>>, ResolveError> {
        match self.get(url)? {
            Some(response) => response
                .bytes()
                .map(|b| Some(b.to_vec()))
                .map_err(|e| ResolveError::Http {
                    url: url.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

fn version_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<version>\s*([^<\s]+)\s*</version>").expect("metadata regex should compile")
    })
}

fn snapshot_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)<snapshotVersion>(.*?)</snapshotVersion>")
            .expect("metadata regex should compile")
    })
}

fn tag_value(block: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    Some(block[start..end].trim().to_string())
}

/// Versions listed in an artifact-level `maven-metadata.xml`
pub fn parse_metadata_versions(xml: &str) -> Vec<String> {
    let versioning = xml
        .find("<versions>")
        .and_then(|start| xml[start..].find("</versions>").map(|end| &xml[start..start + end]))
        .unwrap_or(xml);
    version_tag()
        .captures_iter(versioning)
        .map(|c| c[1].to_string())
        .collect()
}

/// Timestamped version of the plain jar in a snapshot-level `maven-metadata.xml`
pub fn parse_snapshot_jar_version(xml: &str) -> Option<String> {
    snapshot_block().captures_iter(xml).find_map(|c| {
        let block = &c[1];
        let is_plain_jar = tag_value(block, "extension").as_deref() == Some("jar")
            && tag_value(block, "classifier").is_none();
        if is_plain_jar {
            tag_value(block, "value")
        } else {
            None
        }
    })
}
