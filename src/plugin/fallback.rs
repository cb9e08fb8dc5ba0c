//! Regex-based import scanning
//!
//! Used when no analyzer handles a file group or a plugin fails. Detects
//! the common JavaScript/TypeScript forms — `import … from "x"`,
//! `require("x")`, `import("x")` — and resolves relative specifiers
//! against the set of known files. Bare module specifiers (external
//! packages) are ignored.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::domain::{Dependency, DependencyStrength, FileChange};

static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+[^;]*?\s+from\s+['"]([^'"]+)['"]"#).unwrap()
});

static REQUIRE_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

static DYNAMIC_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"import\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Extensions tried when an import omits its suffix
const RESOLUTION_SUFFIXES: &[&str] = &["", ".ts", ".tsx", ".js", ".jsx", "/index.ts", "/index.js"];

/// Scans changed files for import statements, resolving against `files`
pub fn scan_imports(files: &[FileChange]) -> Vec<Dependency> {
    let mut known: BTreeSet<String> = files.iter().map(|f| f.path.clone()).collect();

    // A TypeScript file is importable by its emitted .js name too.
    for file in files {
        if let Some(stem) = file.path.strip_suffix(".ts") {
            known.insert(format!("{}.js", stem));
        }
    }

    let mut dependencies = Vec::new();
    for file in files.iter().filter(|f| f.is_changed) {
        dependencies.extend(scan_file(file, &known));
    }
    dependencies
}

fn scan_file(file: &FileChange, known: &BTreeSet<String>) -> Vec<Dependency> {
    let base_dir = file
        .path
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");

    let mut found = Vec::new();
    for (line_number, line) in file.content.lines().enumerate() {
        for (pattern, kind) in [
            (&*IMPORT_FROM, "import"),
            (&*REQUIRE_CALL, "require"),
            (&*DYNAMIC_IMPORT, "dynamic-import"),
        ] {
            for captures in pattern.captures_iter(line) {
                let specifier = &captures[1];
                let Some(resolved) = resolve_relative(base_dir, specifier, known) else {
                    continue;
                };

                found.push(Dependency {
                    from: file.path.clone(),
                    to: resolved,
                    kind: kind.to_string(),
                    strength: DependencyStrength::Strong,
                    line: Some(line_number as u32 + 1),
                    context: Some(line.trim().to_string()),
                });
            }
        }
    }
    found
}

/// Resolves a relative import specifier to a known file path
///
/// Returns None for bare specifiers and for targets outside the known set.
fn resolve_relative(base_dir: &str, specifier: &str, known: &BTreeSet<String>) -> Option<String> {
    if !specifier.starts_with('.') {
        return None;
    }

    let joined = normalize(base_dir, specifier)?;
    for suffix in RESOLUTION_SUFFIXES {
        let candidate = format!("{}{}", joined, suffix);
        if known.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Joins and normalizes a slash path, rejecting escapes above the root
fn normalize(base_dir: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = if base_dir.is_empty() {
        Vec::new()
    } else {
        base_dir.split('/').collect()
    };

    for part in relative.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    Some(segments.join("/"))
}
