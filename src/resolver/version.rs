//! Version selectors and Maven-style version ordering
//!
//! Ordering splits a version into numeric and qualifier tokens at `.`, `-`,
//! and digit/letter boundaries. Missing trailing tokens compare as a release
//! (`1.0` == `1.0.0`), pre-release qualifiers sort below the release
//! (`1.0-rc1` < `1.0-SNAPSHOT` < `1.0`), and `sp` sorts above it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which versions a coordinate accepts
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VersionSelector {
    /// One concrete version
    Exact(String),
    /// `+`: the highest available version
    Latest,
    /// `1.2.+`: the highest version starting with `1.2.`
    Prefix(String),
}

impl VersionSelector {
    pub fn parse(notation: &str) -> Result<Self, String> {
        let notation = notation.trim();
        if notation.is_empty() {
            return Err("version is empty".to_string());
        }
        if notation.contains(['/', '\\']) || notation == "." || notation == ".." {
            return Err(format!("version '{}' is not a valid path segment", notation));
        }
        if notation == "+" {
            return Ok(Self::Latest);
        }
        if let Some(prefix) = notation.strip_suffix('+') {
            if prefix.contains('+') {
                return Err(format!("version '{}' has more than one '+'", notation));
            }
            return Ok(Self::Prefix(prefix.to_string()));
        }
        if notation.contains('+') {
            return Err(format!("'+' must end the version selector, got '{}'", notation));
        }
        Ok(Self::Exact(notation.to_string()))
    }

    /// True for selectors whose answer can change as new versions are published
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }

    pub fn matches(&self, version: &str) -> bool {
        match self {
            Self::Exact(v) => v == version,
            Self::Latest => true,
            Self::Prefix(prefix) => version.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(v) => f.write_str(v),
            Self::Latest => f.write_str("+"),
            Self::Prefix(prefix) => write!(f, "{}+", prefix),
        }
    }
}

impl From<VersionSelector> for String {
    fn from(selector: VersionSelector) -> Self {
        selector.to_string()
    }
}

impl TryFrom<String> for VersionSelector {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        Self::parse(&value)
    }
}

pub fn is_snapshot(version: &str) -> bool {
    version.ends_with("-SNAPSHOT")
}

/// One version component
///
/// Variant order matters: every qualifier sorts below every number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Token {
    /// Rank, then the lowercased text (empty for release markers)
    Qualifier(u8, String),
    Number(u64),
}

/// Stand-in for a missing trailing component
const RELEASE: Token = Token::Qualifier(RELEASE_RANK, String::new());

const RELEASE_RANK: u8 = 5;

fn qualifier_rank(qualifier: &str) -> u8 {
    match qualifier {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

fn qualifier(text: &str) -> Token {
    let text = text.to_ascii_lowercase();
    match qualifier_rank(&text) {
        RELEASE_RANK => RELEASE,
        rank => Token::Qualifier(rank, text),
    }
}

fn tokenize(version: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    let mut flush = |current: &mut String, is_digit: bool| {
        if current.is_empty() {
            return;
        }
        let token = if is_digit {
            // Absurdly long numbers saturate rather than fail
            Token::Number(current.parse().unwrap_or(u64::MAX))
        } else {
            qualifier(current)
        };
        tokens.push(token);
        current.clear();
    };

    for c in version.chars() {
        if c == '.' || c == '-' || c == '_' {
            flush(&mut current, current_is_digit);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush(&mut current, current_is_digit);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush(&mut current, current_is_digit);
    tokens
}

/// Canonical form: zeros directly before a qualifier and trailing release
/// markers are dropped, so `1`, `1.0`, and `1.0-final` are the same version
/// and `1.0-rc1` is `1-rc1`
fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if matches!(token, Token::Qualifier(..)) {
            while out.last() == Some(&Token::Number(0)) {
                out.pop();
            }
        }
        out.push(token);
    }
    while matches!(out.last(), Some(t) if *t == Token::Number(0) || *t == RELEASE) {
        out.pop();
    }
    out
}

/// Compare two versions
///
/// Components are compared pairwise, the shorter side padded with release
/// markers, which keeps the ordering total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left = normalize(tokenize(a));
    let right = normalize(tokenize(b));
    let len = left.len().max(right.len());
    for i in 0..len {
        let ordering = left
            .get(i)
            .unwrap_or(&RELEASE)
            .cmp(right.get(i).unwrap_or(&RELEASE));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Highest version accepted by `selector`
pub fn select_version<'a, I>(versions: I, selector: &VersionSelector) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter(|v| selector.matches(v))
        .max_by(|a, b| compare_versions(a, b))
}
