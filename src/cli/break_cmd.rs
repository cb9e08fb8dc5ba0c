//! The `break` command
//!
//! Orchestrates the full split: discover changes, analyze dependencies,
//! assemble and validate the plan, get the user's sign-off, then hand the
//! plan to the branch executor.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use super::output::Output;
use super::prompt::{configure_interactively, InteractiveOversize, Prompter, WarnAndProceed};
use crate::config::SplitConfig;
use crate::domain::{
    create_plan, validate_plan, OversizeDecision, Plan, ValidationReport, ValidationStatus,
};
use crate::git::{Brancher, ChangeSet, Differ, GitClient};
use crate::plugin::AnalyzerDriver;

/// Flags accepted by `prsplit break`
pub struct BreakArgs {
    pub source_branch: String,
    pub target: Option<String>,
    pub prefix: Option<String>,
    pub max_size: Option<usize>,
    pub max_depth: Option<usize>,
    pub config: Option<PathBuf>,
    pub non_interactive: bool,
    pub no_push: bool,
    pub plugin_dir: Option<PathBuf>,
}

impl BreakArgs {
    /// Enough explicit flags switch the run to non-interactive mode
    fn flag_count(&self) -> usize {
        [
            self.target.is_some(),
            self.prefix.is_some(),
            self.max_size.is_some(),
            self.max_depth.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }

    fn apply_to(&self, config: &mut SplitConfig) {
        if let Some(target) = &self.target {
            config.target_branch = target.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.branch_prefix = prefix.clone();
        }
        if let Some(max_size) = self.max_size {
            config.max_files_per_partition = max_size;
        }
        if let Some(max_depth) = self.max_depth {
            // Two partitions per depth level is a workable budget.
            config.max_partitions = (max_depth * 2).clamp(1, 100);
        }
        if self.no_push {
            config.push = false;
        }
    }
}

pub fn run(args: BreakArgs, output: &Output) -> Result<()> {
    let client = GitClient::new()?;
    client.validate_repository()?;

    let mut config = match &args.config {
        Some(path) => SplitConfig::load(path)?,
        None => SplitConfig::default(),
    };
    args.apply_to(&mut config);
    config.validate()?;

    let interactive = !args.non_interactive && args.config.is_none() && args.flag_count() < 2;

    client.validate_branch_name(&args.source_branch)?;
    client.validate_branch_name(&config.target_branch)?;

    output.verbose_ctx(
        "break",
        &format!(
            "splitting {} against {}",
            args.source_branch, config.target_branch
        ),
    );

    let differ = Differ::new(&client);
    let change_set = differ.changes(&args.source_branch, &config.target_branch)?;
    for warning in &change_set.warnings {
        output.warn(warning);
    }
    output.verbose_ctx(
        "break",
        &format!(
            "{} changed files, {} context files",
            change_set.changed_count(),
            change_set.files.len() - change_set.changed_count()
        ),
    );

    if interactive {
        config = configure_interactively(&config, change_set.changed_count())?;
    }

    let dependencies = analyze_dependencies(&args, &client, &change_set, output)?;
    output.verbose_ctx("break", &format!("{} dependencies", dependencies.len()));

    let mut interactive_decision = InteractiveOversize::new();
    let mut unattended_decision = WarnAndProceed;
    let decision: &mut dyn OversizeDecision = if args.non_interactive {
        &mut unattended_decision
    } else {
        &mut interactive_decision
    };

    let outcome = create_plan(&change_set.files, &dependencies, &config, decision)?;
    for warning in &outcome.warnings {
        output.warn(warning);
    }

    if !output.is_json() {
        display_plan(&outcome.plan, &config, output);
    }

    if !args.non_interactive {
        let approved = Prompter::new().confirm("Proceed with this partition plan?", true)?;
        if !approved {
            bail!("cancelled by user");
        }
    }

    let report = validate_plan(&outcome.plan, &change_set.files, &dependencies);
    display_validation(&report, output);
    if !report.all_passed() {
        bail!("partition plan validation failed");
    }

    let brancher = Brancher::new(&client);
    let branch_outcome = brancher
        .create_branches(&outcome.plan, &config, &args.source_branch)
        .context("Branch creation failed and was rolled back")?;
    for warning in &branch_outcome.warnings {
        output.warn(warning);
    }

    let missing: Vec<&String> = branch_outcome
        .branches
        .iter()
        .filter(|b| !client.branch_exists(b))
        .collect();
    if !missing.is_empty() {
        bail!("branches missing after creation: {:?}", missing);
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "sourceBranch": args.source_branch,
            "targetBranch": config.target_branch,
            "plan": outcome.plan,
            "createdBranches": branch_outcome.branches,
            "validation": report,
        }));
    } else {
        display_results(&outcome.plan, &branch_outcome.branches, &config, output);
    }

    Ok(())
}

/// Runs the analyzers, or the fallback scanner when none are installed
fn analyze_dependencies(
    args: &BreakArgs,
    client: &GitClient,
    change_set: &ChangeSet,
    output: &Output,
) -> Result<Vec<crate::domain::Dependency>> {
    let plugin_dir = args
        .plugin_dir
        .clone()
        .unwrap_or_else(AnalyzerDriver::default_plugin_dir);

    let (driver, notes) = AnalyzerDriver::discover(&plugin_dir);
    for note in &notes {
        output.verbose_ctx("plugins", note);
    }

    let report = if driver.is_empty() {
        driver.fallback_analyze(&change_set.files)
    } else {
        let root = client.project_root()?;
        driver.analyze(&change_set.files, &root)
    };

    for note in &report.notes {
        output.verbose_ctx("analyze", note);
    }
    for error in &report.errors {
        output.warn(error);
    }

    Ok(report.dependencies)
}

fn display_plan(plan: &Plan, config: &SplitConfig, output: &Output) {
    output.blank();
    println!("Partition plan:");
    output.rule();

    for partition in &plan.partitions {
        println!(
            "Partition {}: {} -> {}",
            partition.id,
            partition.description,
            partition.branch_name(&config.branch_prefix)
        );

        let preview = 3;
        for file in partition.files.iter().take(preview) {
            println!("  - {} ({})", file.path, file.change_type.as_str());
        }
        if partition.len() > preview {
            println!("  ... and {} more files", partition.len() - preview);
        }

        if partition.prerequisites.is_empty() {
            println!("  prerequisites: none (base partition)");
        } else {
            println!("  prerequisites: {:?}", partition.prerequisites);
        }
        output.blank();
    }

    println!(
        "Total: {} files across {} partitions",
        plan.metadata.total_files, plan.metadata.total_partitions
    );
    output.rule();
    output.blank();
}

fn display_validation(report: &ValidationReport, output: &Output) {
    if output.is_json() {
        return;
    }

    println!("Validation results:");
    for result in &report.results {
        let status = match result.status {
            ValidationStatus::Pass => "PASS",
            ValidationStatus::Warn => "WARN",
            ValidationStatus::Fail => "FAIL",
        };
        println!("  [{}] {}: {}", status, result.kind.as_str(), result.message);

        if result.status != ValidationStatus::Pass {
            for detail in &result.details {
                println!("        {}", detail);
            }
        }
    }

    let (pass, warn, fail) = report.counts();
    println!("Summary: {} passed, {} warnings, {} failures", pass, warn, fail);
    output.blank();
}

fn display_results(plan: &Plan, branches: &[String], config: &SplitConfig, output: &Output) {
    output.success(&format!("Created {} branches", branches.len()));
    output.blank();

    for partition in &plan.partitions {
        println!(
            "  {} ({} files)",
            partition.branch_name(&config.branch_prefix),
            partition.len()
        );
    }

    output.blank();
    println!("Next steps:");
    if let Some(first) = branches.first() {
        println!("  1. Open a PR: {} -> {}", first, config.target_branch);
        if branches.len() > 1 {
            println!("  2. After each merge, open the next PR in id order");
        }
        println!(
            "  3. Run 'prsplit rollback {}' to clean up when done",
            config.branch_prefix
        );
    }
}
