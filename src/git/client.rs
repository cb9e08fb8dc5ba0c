//! Git subprocess helpers
//!
//! All git interaction funnels through these helpers so errors carry the
//! failing command and its stderr. Nothing here interprets diff output;
//! that lives in the differ.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Characters git refuses in branch names
const INVALID_BRANCH_CHARS: &[char] = &[' ', '\t', '~', '^', ':', '?', '*', '[', '\\'];

/// Runs a git command and returns its trimmed stdout
pub fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
}

/// Runs a git command for its exit status only
pub fn run_git_quiet(dir: &Path, args: &[&str]) -> Result<()> {
    run_git(dir, args).map(|_| ())
}

/// Handle on a git working directory
#[derive(Debug, Clone)]
pub struct GitClient {
    working_dir: PathBuf,
}

impl GitClient {
    /// Creates a client for the current working directory
    pub fn new() -> Result<Self> {
        let working_dir = std::env::current_dir().context("Failed to get working directory")?;
        Ok(Self { working_dir })
    }

    /// Creates a client for a specific directory
    pub fn at(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        run_git(&self.working_dir, args)
    }

    fn run_quiet(&self, args: &[&str]) -> Result<()> {
        run_git_quiet(&self.working_dir, args)
    }

    /// Verifies we are inside a repository with a clean working tree
    pub fn validate_repository(&self) -> Result<()> {
        self.run_quiet(&["rev-parse", "--git-dir"])
            .context("Not in a git repository")?;

        if self.run_quiet(&["diff", "--quiet"]).is_err() {
            bail!("Working directory has uncommitted changes; commit or stash them first");
        }
        if self.run_quiet(&["diff", "--cached", "--quiet"]).is_err() {
            bail!("Working directory has staged changes; commit or stash them first");
        }
        Ok(())
    }

    /// Checks a branch name for characters git rejects
    pub fn validate_branch_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            bail!("branch name cannot be empty");
        }
        if name.contains(INVALID_BRANCH_CHARS) {
            bail!("branch name '{}' contains invalid characters", name);
        }
        Ok(())
    }

    /// Fails unless the branch resolves to a commit
    pub fn verify_branch(&self, branch: &str) -> Result<()> {
        self.run_quiet(&["rev-parse", "--verify", branch])
            .with_context(|| format!("Branch '{}' not found", branch))
    }

    pub fn branch_exists(&self, branch: &str) -> bool {
        self.run_quiet(&["rev-parse", "--verify", branch]).is_ok()
    }

    pub fn current_branch(&self) -> Result<String> {
        self.run(&["branch", "--show-current"])
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.run_quiet(&["checkout", branch])
    }

    /// The repository root, absolute
    pub fn project_root(&self) -> Result<PathBuf> {
        self.run(&["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    pub fn local_branches(&self) -> Result<Vec<String>> {
        let output = self.run(&["branch", "--format=%(refname:short)"])?;
        Ok(split_lines(&output))
    }

    /// Remote branch names with the `origin/` prefix stripped
    pub fn remote_branches(&self) -> Result<Vec<String>> {
        let output = self.run(&["branch", "-r", "--format=%(refname:short)"])?;
        Ok(split_lines(&output)
            .into_iter()
            .filter(|b| !b.contains("HEAD"))
            .filter_map(|b| b.strip_prefix("origin/").map(str::to_string))
            .collect())
    }

    pub fn delete_local_branch(&self, branch: &str) -> Result<()> {
        self.run_quiet(&["branch", "-D", branch])
    }

    pub fn delete_remote_branch(&self, branch: &str) -> Result<()> {
        self.run_quiet(&["push", "origin", "--delete", branch])
    }
}

fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
