//! CLI entry point, usable directly or as a GitHub Actions step.

// Workflow commands are written to stdout
#![allow(clippy::disallowed_macros)]

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use labelsync::{sync_labels, GitHubClient, Inputs};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let inputs = match Inputs::load() {
        Ok(inputs) => inputs,
        Err(e) => {
            init_tracing(false);
            return fail(&e.into());
        }
    };

    init_tracing(inputs.verbose);

    match run(&inputs).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

/// Log the error and mark the workflow step as failed.
fn fail(e: &anyhow::Error) -> ExitCode {
    error!("{e:#}");
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::error::{e:#}");
    }
    ExitCode::FAILURE
}

async fn run(inputs: &Inputs) -> Result<()> {
    let labels_file = &inputs.labels_file;
    if !labels_file.exists() {
        bail!("Cannot find labels file {}", labels_file.display());
    }

    let client = GitHubClient::new(inputs.token()?, &inputs.api_url)?;

    info!("Using labels file {}", labels_file.display());
    let spec_text = tokio::fs::read_to_string(labels_file)
        .await
        .with_context(|| format!("Failed to read labels file {}", labels_file.display()))?;

    let report = sync_labels(&client, &spec_text, &inputs.repository, inputs.options()).await?;

    info!(
        "{} {} label(s): {} deleted, {} created, {} updated",
        if report.dry_run { "Would change" } else { "Changed" },
        report.mutation_count(),
        report.deleted.len(),
        report.created.len(),
        report.updated.len(),
    );
    Ok(())
}
