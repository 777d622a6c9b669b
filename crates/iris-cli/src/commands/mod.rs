//! CLI commands and argument parsing.

pub mod cleanup;
pub mod plan;
pub mod select;
pub mod tags;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use iris_registry::OciClient;
use iris_sync::{ConfigSync, SyncConfig, SyncIndex, TagCleaner};

/// Iris - registry sync cleanup and descriptor selection
#[derive(Parser)]
#[command(name = "iris")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Delete target tags no sync rule wants
    Cleanup(cleanup::CleanupArgs),

    /// Show what cleanup would delete
    Plan(plan::PlanArgs),

    /// Select a descriptor from a manifest list
    Select(select::SelectArgs),

    /// Filter a list of tags
    Tags(tags::TagsArgs),

    /// Print version information
    Version,
}

/// Config file and target selection shared by `cleanup` and `plan`.
#[derive(Args)]
pub struct ConfigArgs {
    /// Sync configuration file
    #[arg(short, long, env = "IRIS_CONFIG", default_value = "iris.yaml")]
    pub config: PathBuf,

    /// Only process this target
    #[arg(short, long)]
    pub target: Option<String>,
}

impl ConfigArgs {
    /// Loads the configuration and builds a cleaner over the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or is invalid.
    pub fn cleaner(&self) -> Result<TagCleaner<OciClient>> {
        let config = SyncConfig::load(&self.config)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;

        let client = config
            .registry_configs()
            .into_iter()
            .fold(OciClient::new(), OciClient::with_config);

        Ok(TagCleaner::new(client, SyncIndex::from_config(&config)))
    }

    /// Cleanup targets to process, each with the rule that enables it.
    ///
    /// # Errors
    ///
    /// Returns an error if `--target` names no cleanup-enabled target.
    pub fn targets<'a>(&self, index: &'a SyncIndex) -> Result<Vec<(String, &'a ConfigSync)>> {
        let targets: Vec<(String, &ConfigSync)> = index
            .cleanup_targets()
            .into_iter()
            .filter(|(target, _)| self.target.as_deref().map_or(true, |t| t == *target))
            .map(|(target, rule)| (target.to_string(), rule))
            .collect();

        if let Some(ref wanted) = self.target {
            if targets.is_empty() {
                anyhow::bail!("No cleanup-enabled sync rule targets {wanted}");
            }
        }
        Ok(targets)
    }
}
