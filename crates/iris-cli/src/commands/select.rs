//! Select command implementation.
//!
//! Picks one entry from a manifest list the way a client resolving a
//! multi-platform image would.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use iris_core::{MatchOpt, Platform};
use iris_registry::Index;

/// Arguments for the select command.
#[derive(Args)]
pub struct SelectArgs {
    /// Manifest list (OCI image index) as JSON
    #[arg(short, long)]
    pub index: PathBuf,

    /// Platform as os/arch[/variant]
    #[arg(short, long)]
    pub platform: Option<Platform>,

    /// Required artifact type
    #[arg(long)]
    pub artifact_type: Option<String>,

    /// Required annotation as key=value (repeatable)
    #[arg(short, long, value_parser = parse_annotation)]
    pub annotation: Vec<(String, String)>,

    /// Annotation to order candidates by
    #[arg(long)]
    pub sort_annotation: Option<String>,

    /// Sort in descending order
    #[arg(long)]
    pub sort_desc: bool,
}

impl SelectArgs {
    /// Builds the match options, one merge per flag.
    fn match_opt(&self) -> MatchOpt {
        let mut opt = MatchOpt::new();
        if let Some(ref platform) = self.platform {
            opt = opt.merge(&MatchOpt::new().with_platform(platform.clone()));
        }
        if let Some(ref artifact_type) = self.artifact_type {
            opt = opt.merge(&MatchOpt::new().with_artifact_type(artifact_type));
        }
        for (key, value) in &self.annotation {
            opt = opt.merge(&MatchOpt::new().with_annotation(key, value));
        }
        if let Some(ref sort) = self.sort_annotation {
            opt = opt.merge(&MatchOpt::new().with_sort(sort, self.sort_desc));
        }
        opt
    }
}

/// Runs the select command.
///
/// # Errors
///
/// Returns an error if the index cannot be read or parsed, or no entry
/// matches.
pub fn run(args: &SelectArgs) -> Result<()> {
    let content = fs::read_to_string(&args.index)
        .with_context(|| format!("Failed to read {}", args.index.display()))?;
    let index: Index = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", args.index.display()))?;

    let selected = index.select(&args.match_opt())?;
    println!("{}", serde_json::to_string_pretty(selected)?);
    Ok(())
}

fn parse_annotation(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}
