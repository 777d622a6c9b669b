//! Tags command implementation.
//!
//! Filters tags given on the command line through one filter set.

use anyhow::Result;
use clap::Args;
use iris_sync::{filter_tag_list, TagFilterSet};

/// Arguments for the tags command.
#[derive(Args)]
pub struct TagsArgs {
    /// Regex a tag must match (repeatable; any one suffices)
    #[arg(long)]
    pub allow: Vec<String>,

    /// Regex a tag must not match (repeatable)
    #[arg(long)]
    pub deny: Vec<String>,

    /// Semantic version range, e.g. ">=1.2, <2 || >=3"
    #[arg(long)]
    pub semver_range: Option<String>,

    /// Tags to filter
    #[arg(required = true)]
    pub tags: Vec<String>,
}

impl TagsArgs {
    fn filter_set(&self) -> TagFilterSet {
        TagFilterSet {
            allow: self.allow.clone(),
            deny: self.deny.clone(),
            semver_range: self.semver_range.clone().unwrap_or_default(),
        }
    }
}

/// Runs the tags command.
///
/// # Errors
///
/// Returns an error if a pattern or the range does not compile.
pub fn run(args: &TagsArgs) -> Result<()> {
    for tag in filter_tag_list(&args.filter_set(), &args.tags)? {
        println!("{tag}");
    }
    Ok(())
}
