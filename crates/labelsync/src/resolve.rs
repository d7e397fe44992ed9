//! # Specification Resolution
//!
//! Flattens a label specification and everything it `extends` into one
//! ordered list of raw label entries.
//!
//! A document looks like:
//!
//! ```yaml
//! extends:
//!   - acme/shared:labels/base.yml
//!   - acme/shared:labels/triage.yml
//! labels:
//!   - name: bug
//!     color: d73a4a
//!     description: Something isn't working
//! ```
//!
//! The output is the document's own `labels` followed by the resolution of
//! each `extends` reference, depth-first, in declaration order. Sibling
//! references are fetched concurrently but their results are always
//! concatenated in array order.

use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use serde_yaml::Value;
use tracing::debug;

use crate::error::{LabelSyncError, Result};
use crate::fetch::SpecFetcher;
use crate::reference::SpecReference;
use crate::service::ContentSource;

/// An element of a `labels` array, not yet validated.
pub type RawLabelEntry = Value;

/// Recursive resolver over an `extends` graph.
pub struct ConfigResolver<'a, C: ?Sized> {
    fetcher: SpecFetcher<'a, C>,
}

impl<'a, C: ContentSource + ?Sized> ConfigResolver<'a, C> {
    #[must_use]
    pub const fn new(source: &'a C) -> Self {
        Self {
            fetcher: SpecFetcher::new(source),
        }
    }

    /// Resolve a local specification document.
    ///
    /// # Errors
    ///
    /// Any malformed document, bad `extends` value, cyclic reference or fetch
    /// failure anywhere in the graph fails the whole resolution.
    pub async fn resolve(&self, spec_text: &str) -> Result<Vec<RawLabelEntry>> {
        self.resolve_text(spec_text.to_string(), Vec::new()).await
    }

    /// `ancestry` holds the references on the path from the root document to
    /// this one.
    fn resolve_text(
        &self,
        spec_text: String,
        ancestry: Vec<SpecReference>,
    ) -> BoxFuture<'_, Result<Vec<RawLabelEntry>>> {
        async move {
            let document: Value = serde_yaml::from_str(&spec_text)?;

            let Some(labels) = document.get("labels") else {
                return Err(LabelSyncError::InvalidSpec(
                    "missing 'labels' key".to_string(),
                ));
            };
            let Value::Sequence(labels) = labels else {
                return Err(LabelSyncError::InvalidSpec(
                    "'labels' key must be an array".to_string(),
                ));
            };

            let mut entries = Vec::with_capacity(labels.len());
            for entry in labels {
                match entry {
                    Value::Sequence(nested) => entries.extend(nested.iter().cloned()),
                    other => entries.push(other.clone()),
                }
            }

            match document.get("extends") {
                None | Some(Value::Null) => {}
                Some(extends) => {
                    debug!(extends = ?extends, "Found extends tag");
                    entries.extend(self.resolve_extends(extends, &ancestry).await?);
                }
            }

            Ok(entries)
        }
        .boxed()
    }

    async fn resolve_extends(
        &self,
        extends: &Value,
        ancestry: &[SpecReference],
    ) -> Result<Vec<RawLabelEntry>> {
        match extends {
            Value::String(tag) => {
                let reference = SpecReference::parse(tag)?;
                self.resolve_reference(reference, ancestry).await
            }
            Value::Sequence(tags) => {
                let tags = tags
                    .iter()
                    .map(|tag| tag.as_str().ok_or(LabelSyncError::InvalidReference))
                    .collect::<Result<Vec<_>>>()?;
                let references = tags
                    .into_iter()
                    .map(SpecReference::parse)
                    .collect::<Result<Vec<_>>>()?;

                let branches = try_join_all(
                    references
                        .into_iter()
                        .map(|reference| self.resolve_reference(reference, ancestry)),
                )
                .await?;

                Ok(branches.into_iter().flatten().collect())
            }
            _ => Err(LabelSyncError::InvalidReference),
        }
    }

    async fn resolve_reference(
        &self,
        reference: SpecReference,
        ancestry: &[SpecReference],
    ) -> Result<Vec<RawLabelEntry>> {
        if ancestry.contains(&reference) {
            let chain = ancestry
                .iter()
                .chain(std::iter::once(&reference))
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(LabelSyncError::CyclicReference { chain });
        }

        let spec_text = self.fetcher.fetch(&reference).await?;

        let mut child_ancestry = ancestry.to_vec();
        child_ancestry.push(reference);
        self.resolve_text(spec_text, child_ancestry).await
    }
}
