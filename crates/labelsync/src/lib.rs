//! Repository label synchronization.
//!
//! This crate provides:
//! - Parsing of `owner/repo:path` references to remote label specifications
//! - Recursive resolution of `extends` chains into one flat label list
//! - Validation of label entries (name, hex color, description)
//! - Reconciliation of a repository's labels: delete, create, update
//! - A GitHub REST implementation of the content and label collaborators
//!
//! # Usage
//!
//! ```no_run
//! use labelsync::{sync_labels, GitHubClient, ReconcileOptions, RepositoryCoordinates};
//!
//! # async fn example() -> labelsync::Result<()> {
//! let client = GitHubClient::new("ghp_token", labelsync::github::DEFAULT_API_URL)?;
//! let repo = RepositoryCoordinates::new("5dlabs", "cto");
//! let spec = std::fs::read_to_string(".github/labels.yml").unwrap_or_default();
//!
//! let report = sync_labels(&client, &spec, &repo, ReconcileOptions::default()).await?;
//! println!("{} labels changed", report.mutation_count());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod fetch;
pub mod github;
pub mod reconcile;
pub mod reference;
pub mod resolve;
pub mod service;
pub mod sync;
pub mod validate;

pub use config::Inputs;
pub use error::{LabelSyncError, Result};
pub use github::GitHubClient;
pub use reconcile::{ReconcileOptions, ReconcileReport, Reconciler};
pub use reference::{RepositoryCoordinates, SpecReference};
pub use resolve::{ConfigResolver, RawLabelEntry};
pub use service::{ContentSource, LabelMutation, LabelService, RemoteLabel, RepoContent};
pub use sync::sync_labels;
pub use validate::{validate_label, validate_labels, LabelRejection, LabelSpec};
