//! Error types for label resolution and reconciliation.

use thiserror::Error;

/// Fatal errors. Any of these aborts the run; mutations already applied are
/// not rolled back.
#[derive(Debug, Error)]
pub enum LabelSyncError {
    /// An `extends` tag does not look like `owner/repo:path`.
    #[error("Invalid repository tag format: {0}")]
    MalformedReference(String),

    /// A specification document lacks a usable `labels` array.
    #[error("Invalid labels file: {0}")]
    InvalidSpec(String),

    /// The `extends` value is neither a string nor a list of strings.
    #[error("Invalid extends tag: must be a string or an array of strings")]
    InvalidReference,

    /// A reference reappeared among its own ancestors.
    #[error("Cyclic extends chain: {chain}")]
    CyclicReference { chain: String },

    /// The document is not valid YAML.
    #[error("Failed to parse labels file: {0}")]
    SpecParse(#[from] serde_yaml::Error),

    /// The contents endpoint answered with a non-200 status.
    #[error("Failed to fetch labels from repository {reference}: {status}")]
    FetchFailed { reference: String, status: u16 },

    /// The contents endpoint returned a directory, symlink or submodule.
    #[error("Invalid response for {reference}: expected a file, got {kind}")]
    NotAFile { reference: String, kind: String },

    /// File content could not be turned into UTF-8 text.
    #[error("Failed to decode content of {reference}: {reason}")]
    ContentDecode { reference: String, reason: String },

    /// A read-only API call (listing, existence probe) failed.
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// A create, update or delete answered with an unexpected status.
    #[error("Failed to {action} label {name}: {status}")]
    MutationFailed {
        action: &'static str,
        name: String,
        status: u16,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A run input is missing or malformed.
    #[error("{0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, LabelSyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_failure_names_status() {
        let err = LabelSyncError::MutationFailed {
            action: "create",
            name: "bug".to_string(),
            status: 422,
        };
        assert_eq!(err.to_string(), "Failed to create label bug: 422");
    }

    #[test]
    fn test_malformed_reference_message() {
        let err = LabelSyncError::MalformedReference("nope".to_string());
        assert_eq!(err.to_string(), "Invalid repository tag format: nope");
    }
}
