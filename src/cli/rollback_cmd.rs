//! The `rollback` command
//!
//! Deletes every branch carrying the given prefix, local and remote,
//! after showing the kill list and asking for confirmation. Checks out a
//! safe branch first when the current branch is about to disappear.

use anyhow::{Context, Result};

use super::output::Output;
use super::prompt::Prompter;
use crate::git::GitClient;

pub fn run(prefix: &str, assume_yes: bool, output: &Output) -> Result<()> {
    let client = GitClient::new()?;
    client
        .validate_repository()
        .context("Repository validation failed")?;

    output.verbose_ctx("rollback", &format!("searching prefix {}", prefix));

    let local: Vec<String> = client
        .local_branches()?
        .into_iter()
        .filter(|b| b.starts_with(prefix))
        .collect();
    let remote: Vec<String> = client
        .remote_branches()?
        .into_iter()
        .filter(|b| b.starts_with(prefix))
        .collect();

    if local.is_empty() && remote.is_empty() {
        output.success(&format!("No branches found with prefix '{}'", prefix));
        return Ok(());
    }

    if !output.is_json() {
        if !local.is_empty() {
            println!("Local branches ({}):", local.len());
            for branch in &local {
                println!("  {}", branch);
            }
        }
        if !remote.is_empty() {
            println!("Remote branches ({}):", remote.len());
            for branch in &remote {
                println!("  {}", branch);
            }
        }
        println!();
    }

    if !assume_yes {
        let question = format!(
            "Delete {} local and {} remote branches?",
            local.len(),
            remote.len()
        );
        if !Prompter::new().confirm(&question, false)? {
            output.success("Rollback cancelled");
            return Ok(());
        }
    }

    // Step off a branch that is about to be deleted.
    let original = client.current_branch()?;
    let mut safe_branch = original.clone();
    if local.contains(&original) {
        safe_branch = "main".to_string();
        if client.checkout(&safe_branch).is_err() {
            safe_branch = "master".to_string();
            client
                .checkout(&safe_branch)
                .context("Could not check out a safe branch (tried main and master)")?;
        }
        output.verbose_ctx("rollback", &format!("checked out {}", safe_branch));
    }

    let mut deleted = 0usize;
    for branch in &remote {
        match client.delete_remote_branch(branch) {
            Ok(()) => deleted += 1,
            Err(err) => output.warn(&format!("could not delete remote {}: {:#}", branch, err)),
        }
    }
    for branch in &local {
        if branch == &safe_branch {
            output.warn(&format!("skipping current branch {}", branch));
            continue;
        }
        match client.delete_local_branch(branch) {
            Ok(()) => deleted += 1,
            Err(err) => output.warn(&format!("could not delete local {}: {:#}", branch, err)),
        }
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "prefix": prefix,
            "deletedBranches": deleted,
            "currentBranch": safe_branch,
        }));
    } else {
        output.success(&format!(
            "Rollback complete: {} branches deleted (on {})",
            deleted, safe_branch
        ));
    }

    Ok(())
}
