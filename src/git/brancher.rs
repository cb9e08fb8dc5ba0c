//! Branch executor
//!
//! Realises a validated plan as a chain of branches: each partition
//! becomes one branch based on the branch of its highest-numbered
//! prerequisite (or the target branch when it has none), with the
//! partition's files checked out from the source branch and committed.
//! Any failure rolls the repository back to where it started.

use anyhow::{bail, Context, Result};

use super::client::GitClient;
use crate::config::SplitConfig;
use crate::domain::{ChangeType, Partition, Plan};

/// Outcome of realising a plan
#[derive(Debug, Default)]
pub struct BranchOutcome {
    /// Branch names created, in partition order
    pub branches: Vec<String>,

    /// Non-fatal notes gathered along the way
    pub warnings: Vec<String>,
}

/// Creates branches for each partition, with rollback on failure
pub struct Brancher<'a> {
    client: &'a GitClient,
}

impl<'a> Brancher<'a> {
    pub fn new(client: &'a GitClient) -> Self {
        Self { client }
    }

    /// Creates, commits, and optionally pushes one branch per partition
    ///
    /// On any error, every branch created or pushed so far is deleted and
    /// the original branch is checked out again before the error returns.
    pub fn create_branches(
        &self,
        plan: &Plan,
        config: &SplitConfig,
        source_branch: &str,
    ) -> Result<BranchOutcome> {
        let original_branch = self
            .client
            .current_branch()
            .context("Failed to resolve the current branch for rollback")?;

        let mut created: Vec<String> = Vec::new();
        let mut pushed: Vec<String> = Vec::new();
        let mut outcome = BranchOutcome::default();

        let result = self.create_all(
            plan,
            config,
            source_branch,
            &mut created,
            &mut pushed,
            &mut outcome.warnings,
        );

        match result {
            Ok(()) => {
                if self.client.checkout(&original_branch).is_err() {
                    outcome.warnings.push(format!(
                        "could not return to original branch {}",
                        original_branch
                    ));
                    let _ = self.client.checkout(&config.target_branch);
                }
                outcome.branches = created;
                Ok(outcome)
            }
            Err(err) => {
                self.rollback(&created, &pushed, &original_branch);
                Err(err)
            }
        }
    }

    fn create_all(
        &self,
        plan: &Plan,
        config: &SplitConfig,
        source_branch: &str,
        created: &mut Vec<String>,
        pushed: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        for partition in &plan.partitions {
            let branch_name = partition.branch_name(&config.branch_prefix);

            if self.client.branch_exists(&branch_name) {
                bail!("branch '{}' already exists", branch_name);
            }

            let base_branch = self.base_branch_for(partition, plan, config)?;
            super::client::run_git_quiet(
                self.client.working_dir(),
                &["checkout", "-b", &branch_name, &base_branch],
            )
            .with_context(|| format!("Failed to create branch {}", branch_name))?;
            created.push(branch_name.clone());

            self.apply_partition(partition, source_branch, warnings)?;

            if self.has_uncommitted_changes()? {
                let message = format!(
                    "Partition {}: {}\n\nUpdates {} files",
                    partition.id,
                    partition.description,
                    partition.len()
                );
                self.commit(&message)
                    .with_context(|| format!("Failed to commit {}", branch_name))?;
            } else {
                warnings.push(format!("no changes to commit in branch {}", branch_name));
            }

            if config.push {
                super::client::run_git_quiet(
                    self.client.working_dir(),
                    &["push", "origin", &branch_name],
                )
                .with_context(|| format!("Failed to push branch {}", branch_name))?;
                pushed.push(branch_name);
            }
        }
        Ok(())
    }

    /// The branch this partition builds on
    ///
    /// Partitions without prerequisites start from the target branch;
    /// everything else stacks on its highest-numbered prerequisite so the
    /// chain merges cleanly in id order.
    fn base_branch_for(
        &self,
        partition: &Partition,
        plan: &Plan,
        config: &SplitConfig,
    ) -> Result<String> {
        let Some(&last_prereq) = partition.prerequisites.last() else {
            return Ok(config.target_branch.clone());
        };

        let base = plan
            .partition(last_prereq)
            .map(|p| p.branch_name(&config.branch_prefix))
            .with_context(|| format!("partition {} not found in plan", last_prereq))?;

        if !self.client.branch_exists(&base) {
            bail!("prerequisite branch '{}' does not exist", base);
        }
        Ok(base)
    }

    /// Applies one partition's file operations from the source branch
    fn apply_partition(
        &self,
        partition: &Partition,
        source_branch: &str,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        for file in partition.files.iter().filter(|f| f.is_changed) {
            match file.change_type {
                ChangeType::Add | ChangeType::Modify => {
                    self.checkout_file(source_branch, &file.path)
                        .with_context(|| format!("Failed to checkout {}", file.path))?;
                }
                ChangeType::Delete => {
                    self.remove_file(&file.path)
                        .with_context(|| format!("Failed to delete {}", file.path))?;
                }
                ChangeType::Rename => {
                    if let Some(old) = &file.old_path {
                        if self.remove_file(old).is_err() {
                            warnings.push(format!("could not delete renamed file {}", old));
                        }
                    }
                    self.checkout_file(source_branch, &file.path)
                        .with_context(|| format!("Failed to checkout renamed {}", file.path))?;
                }
            }
        }
        Ok(())
    }

    fn checkout_file(&self, branch: &str, path: &str) -> Result<()> {
        super::client::run_git_quiet(
            self.client.working_dir(),
            &["checkout", branch, "--", path],
        )
    }

    fn remove_file(&self, path: &str) -> Result<()> {
        super::client::run_git_quiet(self.client.working_dir(), &["rm", path])
    }

    fn commit(&self, message: &str) -> Result<()> {
        super::client::run_git_quiet(self.client.working_dir(), &["add", "."])?;
        super::client::run_git_quiet(self.client.working_dir(), &["commit", "-m", message])
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let dir = self.client.working_dir();
        if super::client::run_git_quiet(dir, &["diff", "--cached", "--quiet"]).is_err() {
            return Ok(true);
        }
        if super::client::run_git_quiet(dir, &["diff", "--quiet"]).is_err() {
            return Ok(true);
        }
        let status = super::client::run_git(dir, &["status", "--porcelain"])?;
        Ok(!status.trim().is_empty())
    }

    /// Deletes everything created so far and returns to the original branch
    fn rollback(&self, created: &[String], pushed: &[String], original_branch: &str) {
        if created.is_empty() && pushed.is_empty() {
            return;
        }

        let _ = self.client.checkout(original_branch);

        for branch in pushed {
            let _ = self.client.delete_remote_branch(branch);
        }
        for branch in created {
            if branch != original_branch {
                let _ = self.client.delete_local_branch(branch);
            }
        }
    }
}
