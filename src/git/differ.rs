//! Change discovery
//!
//! Turns `git diff --numstat -M90 target...source` into `FileChange`
//! records with rename detection, then walks the working tree for context
//! files so analyzers can resolve imports into unchanged code. Binary
//! files are excluded by an extension allowlist; the allowlist and ignore
//! list are policy tables, not engine behavior.

use std::path::Path;

use anyhow::{bail, Context, Result};

use super::client::GitClient;
use crate::domain::{is_valid_path, ChangeType, FileChange};

/// Extensions included in analysis
const RELEVANT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".json", ".py", ".pyi"];

/// Path fragments excluded from the context walk
const IGNORED_FRAGMENTS: &[&str] = &[
    "node_modules/",
    "dist/",
    "build/",
    ".next/",
    "coverage/",
    ".git/",
    "__pycache__/",
    ".pytest_cache/",
    ".vscode/",
    ".idea/",
];

/// Rename similarity threshold passed to git
const RENAME_THRESHOLD: &str = "-M90";

/// Discovered changes plus non-fatal parsing warnings
#[derive(Debug, Default)]
pub struct ChangeSet {
    pub files: Vec<FileChange>,
    pub warnings: Vec<String>,
}

impl ChangeSet {
    /// Number of actually changed files (context excluded)
    pub fn changed_count(&self) -> usize {
        self.files.iter().filter(|f| f.is_changed).count()
    }
}

/// Reads changes between two branches
pub struct Differ<'a> {
    client: &'a GitClient,
}

impl<'a> Differ<'a> {
    pub fn new(client: &'a GitClient) -> Self {
        Self { client }
    }

    /// Produces the full change set between target and source
    pub fn changes(&self, source_branch: &str, target_branch: &str) -> Result<ChangeSet> {
        self.client
            .verify_branch(source_branch)
            .with_context(|| format!("source branch '{}'", source_branch))?;
        self.client
            .verify_branch(target_branch)
            .with_context(|| format!("target branch '{}'", target_branch))?;

        let range = format!("{}...{}", target_branch, source_branch);
        let output = super::client::run_git(
            self.client.working_dir(),
            &["diff", "--numstat", RENAME_THRESHOLD, &range],
        )?;

        let mut set = ChangeSet::default();
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            match parse_numstat_line(line) {
                Some(mut change) => {
                    self.attach_content(&mut change, source_branch, &mut set.warnings);
                    set.files.push(change);
                }
                None => set
                    .warnings
                    .push(format!("skipping malformed diff line: {}", line)),
            }
        }

        if set.files.is_empty() {
            bail!(
                "no relevant file changes found between {} and {}",
                target_branch,
                source_branch
            );
        }

        self.collect_context_files(&mut set)?;
        Ok(set)
    }

    /// Reads a changed file's content from the source branch
    fn attach_content(&self, change: &mut FileChange, source: &str, warnings: &mut Vec<String>) {
        if change.change_type == ChangeType::Delete {
            return;
        }

        let spec = format!("{}:{}", source, change.path);
        match super::client::run_git(self.client.working_dir(), &["show", &spec]) {
            Ok(content) => change.content = content,
            Err(err) => warnings.push(format!(
                "could not read content for {}: {:#}",
                change.path, err
            )),
        }
    }

    /// Walks the repository for unchanged files analyzers may need
    fn collect_context_files(&self, set: &mut ChangeSet) -> Result<()> {
        let root = self.client.project_root()?;
        let mut context = Vec::new();
        walk_tree(&root, &root, &mut context, &mut set.warnings)?;

        for file in context {
            if !set.files.iter().any(|c| c.path == file.path) {
                set.files.push(file);
            }
        }
        Ok(())
    }
}

fn walk_tree(
    root: &Path,
    dir: &Path,
    out: &mut Vec<FileChange>,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Ok(()),
    };

    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        if path.is_dir() {
            walk_tree(root, &path, out, warnings)?;
            continue;
        }

        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        let rel = rel.to_string_lossy().replace('\\', "/");

        if !is_relevant_file(&rel) || should_ignore(&rel) {
            continue;
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => out.push(FileChange::context(rel, content)),
            Err(err) => warnings.push(format!("could not read {}: {}", rel, err)),
        }
    }
    Ok(())
}

/// True when the extension is on the analysis allowlist
pub fn is_relevant_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    RELEVANT_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// True for vendored, generated, and fixture paths
pub fn should_ignore(path: &str) -> bool {
    if IGNORED_FRAGMENTS.iter().any(|frag| path.contains(frag)) {
        return true;
    }
    path.contains(".test.") || path.contains(".spec.")
}

/// Parses one `git diff --numstat` line into a change record
pub fn parse_numstat_line(line: &str) -> Option<FileChange> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return None;
    }

    let lines_added = parse_count(fields[0]);
    let lines_deleted = parse_count(fields[1]);

    // `-z`-less rename output may arrive as one brace-format field or as
    // two separate old/new fields.
    let (change_type, path, old_path) = if fields.len() >= 4 {
        let old = fields[2].to_string();
        let new = fields[3].to_string();
        (ChangeType::Rename, new, Some(old))
    } else if let Some((old, new)) = parse_rename_path(fields[2]) {
        (ChangeType::Rename, new, Some(old))
    } else {
        let path = fields[2].to_string();
        (classify(lines_added, lines_deleted), path, None)
    };

    if !is_valid_path(&path) {
        return None;
    }
    if let Some(old) = &old_path {
        if !is_valid_path(old) {
            return None;
        }
    }

    Some(FileChange {
        path,
        change_type,
        content: String::new(),
        lines_added,
        lines_deleted,
        is_changed: true,
        old_path,
    })
}

fn parse_count(field: &str) -> u32 {
    // "-" marks a binary file
    field.parse().unwrap_or(0)
}

fn classify(added: u32, deleted: u32) -> ChangeType {
    if added == 0 && deleted != 0 {
        ChangeType::Delete
    } else if added != 0 && deleted == 0 {
        ChangeType::Add
    } else {
        ChangeType::Modify
    }
}

/// Parses git's rename notation: `dir/{old => new}/file` or `old => new`
pub fn parse_rename_path(path: &str) -> Option<(String, String)> {
    if !path.contains(" => ") {
        return None;
    }

    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open >= close {
            return None;
        }
        let (before, rest) = path.split_at(open);
        let inner = &rest[1..close - open];
        let after = &rest[close - open + 1..];

        let (old_part, new_part) = inner.split_once(" => ")?;
        let old = collapse_slashes(&format!("{}{}{}", before, old_part, after));
        let new = collapse_slashes(&format!("{}{}{}", before, new_part, after));
        return Some((old, new));
    }

    let (old, new) = path.split_once(" => ")?;
    Some((old.trim().to_string(), new.trim().to_string()))
}

/// Empty rename segments leave double slashes behind
fn collapse_slashes(path: &str) -> String {
    let mut out = path.replace("//", "/");
    while out.contains("//") {
        out = out.replace("//", "/");
    }
    out
}
