//! Run inputs.
//!
//! Every input can be passed as a flag or through the environment variables a
//! GitHub Actions runner sets for action inputs (`INPUT_<NAME>`, with the
//! input name upper-cased and its dashes kept).

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;

use crate::error::{LabelSyncError, Result};
use crate::github::DEFAULT_API_URL;
use crate::reconcile::ReconcileOptions;
use crate::reference::RepositoryCoordinates;

#[derive(Debug, Clone, Parser)]
#[command(name = "labelsync")]
#[command(about = "Synchronize repository labels with a YAML specification")]
#[command(version)]
pub struct Inputs {
    /// Token used for all GitHub API calls
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to the local labels specification
    #[arg(long, env = "INPUT_LABELS-FILE")]
    pub labels_file: PathBuf,

    /// Keep labels that are not in the specification ("true" or "false")
    #[arg(long, env = "INPUT_SKIP-DELETE", default_value = "false", value_parser = parse_flag)]
    pub skip_delete: bool,

    /// Compute and report changes without applying them ("true" or "false")
    #[arg(long, env = "INPUT_DRY-RUN", default_value = "false", value_parser = parse_flag)]
    pub dry_run: bool,

    /// Target repository in owner/repo format
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: RepositoryCoordinates,

    /// GitHub REST API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Inputs {
    /// Read inputs from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// See [`Inputs::load_from`].
    pub fn load() -> Result<Self> {
        Self::load_from(std::env::args_os())
    }

    /// Read inputs from `args` and the environment.
    ///
    /// `--help` and `--version` print and exit the process like any clap
    /// binary. Every other parse failure is returned as an input error so it
    /// goes through the same failure reporting as the rest of the run.
    ///
    /// # Errors
    ///
    /// Returns [`LabelSyncError::InvalidInput`] for missing or malformed
    /// inputs.
    pub fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => input_error(&e),
        })
    }

    #[must_use]
    pub const fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            skip_delete: self.skip_delete,
            dry_run: self.dry_run,
        }
    }

    /// The action input wins over the ambient `GITHUB_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`LabelSyncError::InvalidInput`] when neither is set.
    pub fn token(&self) -> Result<String> {
        self.github_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                LabelSyncError::InvalidInput("Input required and not supplied: github-token".into())
            })
    }
}

/// First line of clap's rendering, without the `error: ` prefix or usage.
fn input_error(e: &clap::Error) -> LabelSyncError {
    let rendered = e.to_string();
    let message = rendered.lines().next().unwrap_or_default();
    LabelSyncError::InvalidInput(message.trim_start_matches("error: ").to_string())
}

/// Accept exactly `true` or `false`.
fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("must be 'true' or 'false', got '{other}'")),
    }
}
