//! Remote specification fetching.

use base64::Engine;
use tracing::{debug, info};

use crate::error::{LabelSyncError, Result};
use crate::reference::SpecReference;
use crate::service::ContentSource;

/// Fetches specification text from another repository.
pub struct SpecFetcher<'a, C: ?Sized> {
    source: &'a C,
}

impl<'a, C: ContentSource + ?Sized> SpecFetcher<'a, C> {
    #[must_use]
    pub const fn new(source: &'a C) -> Self {
        Self { source }
    }

    /// Fetch the file behind `reference` and decode it to UTF-8 text.
    ///
    /// # Errors
    ///
    /// Fails if the content call fails, the path is not a regular file, or
    /// the payload is not base64-encoded UTF-8.
    /// Any encoding other than `base64` is rejected.
    pub async fn fetch(&self, reference: &SpecReference) -> Result<String> {
        info!(reference = %reference, "Fetching YAML from repository");

        let content = self.source.get_content(reference).await?;
        if content.kind != "file" {
            return Err(LabelSyncError::NotAFile {
                reference: reference.to_string(),
                kind: content.kind,
            });
        }

        let decode_error = |reason: String| LabelSyncError::ContentDecode {
            reference: reference.to_string(),
            reason,
        };

        if content.encoding.as_deref() != Some("base64") {
            let encoding = content.encoding.as_deref().unwrap_or("missing");
            return Err(decode_error(format!("unsupported encoding {encoding}")));
        }

        let encoded = content.content.unwrap_or_default();

        // GitHub wraps the base64 payload every 60 characters
        let encoded: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| decode_error(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))?;

        debug!(reference = %reference, bytes = text.len(), "Fetched specification");
        Ok(text)
    }
}
