//! Collaborator interfaces for repository content and label management.
//!
//! The resolver and reconciler only talk to these traits, so the whole engine
//! runs against [`crate::github::GitHubClient`] in production and an
//! in-memory fake in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reference::{RepositoryCoordinates, SpecReference};
use crate::validate::LabelSpec;

/// Raw answer of the repository contents endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoContent {
    /// `file`, `dir`, `symlink` or `submodule`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64 payload, possibly wrapped across lines. Absent for directories.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// A label as the remote repository reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLabel {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<RemoteLabel> for LabelSpec {
    fn from(label: RemoteLabel) -> Self {
        Self {
            name: label.name,
            color: label.color,
            description: label.description.unwrap_or_default(),
        }
    }
}

/// Outcome of a create, update or delete call.
///
/// The status is reported as-is; deciding whether it counts as success is up
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMutation {
    pub status: u16,
    pub label: LabelSpec,
}

/// Reads specification files from other repositories.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch a file at the repository's default ref.
    async fn get_content(&self, reference: &SpecReference) -> Result<RepoContent>;
}

/// Reads and mutates the label collection of a repository.
#[async_trait]
pub trait LabelService: Send + Sync {
    /// Every label on the repository, across all pages.
    async fn list_labels(&self, repo: &RepositoryCoordinates) -> Result<Vec<RemoteLabel>>;

    /// Look up a single label; `None` when it does not exist.
    async fn get_label(
        &self,
        repo: &RepositoryCoordinates,
        name: &str,
    ) -> Result<Option<RemoteLabel>>;

    async fn create_label(
        &self,
        repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation>;

    async fn update_label(
        &self,
        repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation>;

    async fn delete_label(
        &self,
        repo: &RepositoryCoordinates,
        label: &LabelSpec,
    ) -> Result<LabelMutation>;
}
