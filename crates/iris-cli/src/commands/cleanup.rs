//! Cleanup command implementation.
//!
//! Runs target cleanup once per distinct cleanup-enabled target.

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::ConfigArgs;

/// Arguments for the cleanup command.
#[derive(Args)]
pub struct CleanupArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Runs the cleanup command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or any target
/// reports a failure.
pub async fn run(args: &CleanupArgs) -> Result<()> {
    let cleaner = args.config.cleaner()?;
    let targets = args.config.targets(cleaner.index())?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping cleanup");
            on_signal.cancel();
        }
    });

    let mut failed = Vec::new();
    for (target, rule) in targets {
        if cancel.is_cancelled() {
            failed.push(target);
            continue;
        }

        match cleaner.cleanup_tags(rule, &target, &cancel).await {
            Ok(summary) => {
                info!(
                    repository = %summary.target,
                    deleted = summary.deleted.len(),
                    retained = summary.retained.len(),
                    "Cleanup complete"
                );
                for tag in &summary.deleted {
                    println!("deleted {}:{tag}", summary.target);
                }
            }
            Err(e) => {
                if let Some(failures) = e.deletion_failures() {
                    for tag in failures.deleted() {
                        println!("deleted {}:{tag}", failures.target());
                    }
                }
                error!(repository = %target, error = %e, "Cleanup failed");
                failed.push(target);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Cleanup failed for {} target(s): {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
