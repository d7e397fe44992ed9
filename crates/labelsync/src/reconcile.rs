//! # Label Reconciliation
//!
//! Brings a repository's labels in line with a desired set:
//!
//! 1. **Delete** every current label whose name is not desired. All deletions
//!    are issued concurrently. Skipped entirely with `skip_delete`.
//! 2. **Upsert** every desired label in order. A producer probes whether each
//!    label exists and hands `(label, exists)` pairs to a consumer that
//!    creates or updates them strictly one at a time.
//!
//! In dry-run mode the probes still run (they are read-only) but every
//! mutation is replaced by a synthesized success carrying the same label.

use std::collections::HashSet;

use futures::future::try_join_all;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{LabelSyncError, Result};
use crate::reference::RepositoryCoordinates;
use crate::service::{LabelMutation, LabelService};
use crate::validate::LabelSpec;

/// How many probed labels may wait for the mutation consumer.
const PROBE_LOOKAHEAD: usize = 1;

/// Switches for a reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub skip_delete: bool,
    pub dry_run: bool,
}

/// What a run changed, or would have changed in dry-run mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub deleted: Vec<LabelSpec>,
    pub created: Vec<LabelSpec>,
    pub updated: Vec<LabelSpec>,
    pub dry_run: bool,
}

impl ReconcileReport {
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.deleted.len() + self.created.len() + self.updated.len()
    }
}

/// A desired label paired with the result of its existence probe.
#[derive(Debug)]
struct ProbedLabel {
    label: LabelSpec,
    exists: bool,
}

#[derive(Debug, Clone, Copy)]
enum Upsert {
    Create,
    Update,
}

impl Upsert {
    const fn action(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }

    const fn done(self) -> &'static str {
        match self {
            Self::Create => "Created",
            Self::Update => "Updated",
        }
    }
}

/// Read the repository's labels, normalizing a missing description to `""`.
///
/// # Errors
///
/// Propagates listing failures.
pub async fn list_current<S: LabelService + ?Sized>(
    service: &S,
    repo: &RepositoryCoordinates,
) -> Result<Vec<LabelSpec>> {
    let labels = service.list_labels(repo).await?;
    Ok(labels.into_iter().map(LabelSpec::from).collect())
}

/// Applies a desired label set to one repository.
pub struct Reconciler<'a, S: ?Sized> {
    service: &'a S,
    repo: &'a RepositoryCoordinates,
    options: ReconcileOptions,
}

impl<'a, S: LabelService + ?Sized> Reconciler<'a, S> {
    #[must_use]
    pub const fn new(
        service: &'a S,
        repo: &'a RepositoryCoordinates,
        options: ReconcileOptions,
    ) -> Self {
        Self {
            service,
            repo,
            options,
        }
    }

    /// Delete, then upsert.
    ///
    /// # Errors
    ///
    /// The first failed call or unexpected status aborts the run. Mutations
    /// that already went through stay applied.
    pub async fn reconcile(
        &self,
        current: &[LabelSpec],
        desired: &[LabelSpec],
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport {
            dry_run: self.options.dry_run,
            ..ReconcileReport::default()
        };

        if self.options.skip_delete {
            debug!("Skipping deletion of labels not in the specification");
        } else {
            report.deleted = self.delete_stale(current, desired).await?;
        }

        let (created, updated) = self.upsert_desired(desired).await?;
        report.created = created;
        report.updated = updated;

        Ok(report)
    }

    async fn delete_stale(
        &self,
        current: &[LabelSpec],
        desired: &[LabelSpec],
    ) -> Result<Vec<LabelSpec>> {
        if self.options.dry_run {
            warn!("Running in dry run mode, no labels will be deleted");
        }

        let wanted: HashSet<&str> = desired.iter().map(|label| label.name.as_str()).collect();
        let stale: Vec<&LabelSpec> = current
            .iter()
            .filter(|label| !wanted.contains(label.name.as_str()))
            .collect();

        if stale.is_empty() {
            return Ok(Vec::new());
        }

        try_join_all(stale.into_iter().map(|label| self.delete_one(label))).await
    }

    async fn delete_one(&self, label: &LabelSpec) -> Result<LabelSpec> {
        info!(label = %label.name, "Deleting label");

        let response = if self.options.dry_run {
            simulated(label)
        } else {
            self.service.delete_label(self.repo, label).await?
        };

        // 204 No Content is how GitHub acknowledges a deletion
        check_status("delete", response, &[200, 201, 204])
    }

    async fn upsert_desired(
        &self,
        desired: &[LabelSpec],
    ) -> Result<(Vec<LabelSpec>, Vec<LabelSpec>)> {
        if self.options.dry_run {
            warn!("Running in dry run mode, no labels will be created");
        }

        if desired.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        let (tx, rx) = mpsc::channel(PROBE_LOOKAHEAD);

        let ((), applied) = tokio::try_join!(self.probe(desired, tx), self.apply(rx))?;
        Ok(applied)
    }

    /// Producer: probe each desired label in order.
    async fn probe(&self, desired: &[LabelSpec], tx: mpsc::Sender<ProbedLabel>) -> Result<()> {
        for label in desired {
            let exists = self
                .service
                .get_label(self.repo, &label.name)
                .await?
                .is_some();

            let probed = ProbedLabel {
                label: label.clone(),
                exists,
            };
            if tx.send(probed).await.is_err() {
                // Consumer is gone; its error is what gets reported.
                break;
            }
        }
        Ok(())
    }

    /// Consumer: one create or update in flight at a time.
    async fn apply(
        &self,
        mut rx: mpsc::Receiver<ProbedLabel>,
    ) -> Result<(Vec<LabelSpec>, Vec<LabelSpec>)> {
        let mut created = Vec::new();
        let mut updated = Vec::new();

        while let Some(ProbedLabel { label, exists }) = rx.recv().await {
            let upsert = if exists {
                info!(label = %label.name, "Label already exists, updating");
                Upsert::Update
            } else {
                info!(label = %label.name, "Label does not exist, creating");
                Upsert::Create
            };

            let response = if self.options.dry_run {
                simulated(&label)
            } else {
                match upsert {
                    Upsert::Create => self.service.create_label(self.repo, &label).await?,
                    Upsert::Update => self.service.update_label(self.repo, &label).await?,
                }
            };

            let applied = check_status(upsert.action(), response, &[200, 201])?;
            info!("{} label: {} ({})", upsert.done(), applied.name, applied.color);

            match upsert {
                Upsert::Create => created.push(applied),
                Upsert::Update => updated.push(applied),
            }
        }

        Ok((created, updated))
    }
}

fn simulated(label: &LabelSpec) -> LabelMutation {
    LabelMutation {
        status: 200,
        label: label.clone(),
    }
}

fn check_status(
    action: &'static str,
    response: LabelMutation,
    accepted: &[u16],
) -> Result<LabelSpec> {
    if accepted.contains(&response.status) {
        Ok(response.label)
    } else {
        Err(LabelSyncError::MutationFailed {
            action,
            name: response.label.name,
            status: response.status,
        })
    }
}
