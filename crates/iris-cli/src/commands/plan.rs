//! Plan command implementation.
//!
//! Lists each cleanup target and prints what a cleanup would do.

use anyhow::{Context, Result};
use clap::Args;
use iris_sync::CleanupPlan;
use tokio_util::sync::CancellationToken;

use super::ConfigArgs;

/// Arguments for the plan command.
#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Runs the plan command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, a target cannot
/// be listed, or a pattern does not compile.
pub async fn run(args: &PlanArgs) -> Result<()> {
    let cleaner = args.config.cleaner()?;
    let cancel = CancellationToken::new();

    for (target, rule) in args.config.targets(cleaner.index())? {
        let plan = cleaner
            .dry_run(rule, &target, &cancel)
            .await
            .with_context(|| format!("Failed to plan cleanup for {target}"))?;
        print!("{}", render(&plan));
    }
    Ok(())
}

fn render(plan: &CleanupPlan) -> String {
    let mut out = format!("{}\n", plan.target);
    out.push_str(&format!("  wanted:   {}\n", plan.wanted.join(", ")));
    for (tag, pattern) in &plan.excluded {
        out.push_str(&format!("  excluded: {tag} (matches {pattern})\n"));
    }
    if plan.is_noop() {
        out.push_str("  nothing to delete\n");
    } else {
        out.push_str(&format!("  delete:   {}\n", plan.delete.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_plan() {
        let plan = CleanupPlan {
            target: "registry.example.com/mirror/app".to_string(),
            tags: vec!["v1".into(), "keep-1".into(), "old".into()],
            wanted: vec!["v1".into()],
            excluded: vec![("keep-1".into(), "^keep-".into())],
            delete: vec!["old".into()],
        };
        let out = render(&plan);
        assert!(out.starts_with("registry.example.com/mirror/app\n"));
        assert!(out.contains("excluded: keep-1 (matches ^keep-)"));
        assert!(out.contains("delete:   old"));
    }

    #[test]
    fn test_render_noop() {
        let plan = CleanupPlan {
            target: "registry.example.com/mirror/app".to_string(),
            ..CleanupPlan::default()
        };
        assert!(render(&plan).contains("nothing to delete"));
    }
}
