//! # Label Validation
//!
//! Turns raw entries from a resolved specification into [`LabelSpec`]s.
//! Rejections are never fatal: the offending entry is logged and dropped,
//! and the remaining entries are still processed.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::resolve::RawLabelEntry;

/// Three or six hex digits covering the whole string, no leading `#`.
static COLOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})$").expect("color pattern is valid")
});

/// A validated label, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSpec {
    pub name: String,
    pub color: String,
    pub description: String,
}

impl LabelSpec {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: description.into(),
        }
    }
}

/// Why an entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelRejection {
    #[error("Invalid label, must be an object")]
    NotAnObject,

    #[error("Invalid label, must have a name that is a non-empty string")]
    InvalidName,

    #[error("Invalid label, must have a color that is a hexadecimal color string without a #")]
    InvalidColor,

    #[error("Invalid label description, must be a string")]
    InvalidDescription,
}

/// Check one raw entry and project it onto a [`LabelSpec`].
///
/// # Errors
///
/// Returns the first rule the entry breaks, in this order: shape, name,
/// color, description.
pub fn validate_label(entry: &RawLabelEntry) -> Result<LabelSpec, LabelRejection> {
    let Value::Mapping(fields) = entry else {
        return Err(LabelRejection::NotAnObject);
    };

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => return Err(LabelRejection::InvalidName),
    };

    // Unquoted YAML colors such as 123456 arrive as numbers and are rejected
    // along with everything else that is not a string.
    let color = match fields.get("color") {
        Some(Value::String(color)) if COLOR_PATTERN.is_match(color) => color.clone(),
        _ => return Err(LabelRejection::InvalidColor),
    };

    let description = match fields.get("description") {
        None => String::new(),
        Some(Value::String(description)) => description.clone(),
        Some(_) => return Err(LabelRejection::InvalidDescription),
    };

    Ok(LabelSpec {
        name,
        color,
        description,
    })
}

/// Validate every entry, keeping the valid ones in order.
pub fn validate_labels(entries: &[RawLabelEntry]) -> Vec<LabelSpec> {
    entries
        .iter()
        .filter_map(|entry| {
            debug!(label = %render_entry(entry), "Processing label");
            match validate_label(entry) {
                Ok(label) => Some(label),
                Err(rejection) => {
                    warn!("{rejection}. Skipping: {}", render_entry(entry));
                    None
                }
            }
        })
        .collect()
}

/// Compact single-line rendering for log messages.
fn render_entry(entry: &RawLabelEntry) -> String {
    serde_json::to_string(entry).unwrap_or_else(|_| format!("{entry:?}"))
}
