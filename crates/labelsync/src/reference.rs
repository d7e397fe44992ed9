//! Repository and specification-file coordinates.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LabelSyncError, Result};

/// `owner/repo:path`, where owner and repo hold neither `/` nor `:`.
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^/:]+)/([^/:]+):(.+)$").expect("reference pattern is valid")
});

/// A label specification file living in another repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecReference {
    pub owner: String,
    pub repo: String,
    /// Path inside the repository; may contain `/`.
    pub path: String,
}

impl SpecReference {
    /// Parse a compact `owner/repo:path` tag.
    ///
    /// # Errors
    ///
    /// Returns [`LabelSyncError::MalformedReference`] if the tag does not
    /// match the pattern.
    pub fn parse(tag: &str) -> Result<Self> {
        let captures = REFERENCE_PATTERN
            .captures(tag)
            .ok_or_else(|| LabelSyncError::MalformedReference(tag.to_string()))?;

        Ok(Self {
            owner: captures[1].to_string(),
            repo: captures[2].to_string(),
            path: captures[3].to_string(),
        })
    }
}

impl FromStr for SpecReference {
    type Err = LabelSyncError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SpecReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.owner, self.repo, self.path)
    }
}

/// The repository whose labels are being reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepositoryCoordinates {
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl FromStr for RepositoryCoordinates {
    type Err = LabelSyncError;

    /// Parse `owner/repo`, as found in `GITHUB_REPOSITORY`.
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(LabelSyncError::InvalidInput(format!(
                "Invalid repository: {s} (expected owner/repo)"
            ))),
        }
    }
}

impl fmt::Display for RepositoryCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
