//! Top-level run: resolve, validate, read current state, reconcile.

use tracing::{debug, info};

use crate::error::Result;
use crate::reconcile::{list_current, ReconcileOptions, ReconcileReport, Reconciler};
use crate::reference::RepositoryCoordinates;
use crate::resolve::ConfigResolver;
use crate::service::{ContentSource, LabelService};
use crate::validate::validate_labels;

/// Reconcile `repo` against the specification in `spec_text`.
///
/// Every call recomputes both the desired and the current state from scratch.
///
/// # Errors
///
/// Any fatal resolution, listing or mutation error. Rejected label entries
/// are only logged.
pub async fn sync_labels<S>(
    service: &S,
    spec_text: &str,
    repo: &RepositoryCoordinates,
    options: ReconcileOptions,
) -> Result<ReconcileReport>
where
    S: ContentSource + LabelService + ?Sized,
{
    let resolved = ConfigResolver::new(service).resolve(spec_text).await?;
    let desired = validate_labels(&resolved);
    debug!(
        resolved = resolved.len(),
        valid = desired.len(),
        "Parsed labels: {desired:#?}"
    );

    let current = list_current(service, repo).await?;
    debug!("Current labels in repository: {current:#?}");

    let report = Reconciler::new(service, repo, options)
        .reconcile(&current, &desired)
        .await?;

    info!(
        repo = %repo,
        deleted = report.deleted.len(),
        created = report.created.len(),
        updated = report.updated.len(),
        dry_run = report.dry_run,
        "Label sync finished"
    );
    Ok(report)
}
