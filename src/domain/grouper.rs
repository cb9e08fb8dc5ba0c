//! Residual file grouping
//!
//! Secondary bucketing used when dependency depth does not disambiguate:
//! files are tagged by extension category, then top-level directory, then
//! test-path fragments. The tables below are policy, kept as plain lookup
//! data so they can be tuned without touching the algorithms.

use std::collections::BTreeMap;

use super::change::FileChange;

/// Extension → group tag
const EXTENSION_GROUPS: &[(&str, &str)] = &[
    ("md", "documentation"),
    ("txt", "documentation"),
    ("mdx", "documentation"),
    ("json", "configuration"),
    ("yaml", "configuration"),
    ("yml", "configuration"),
    ("toml", "configuration"),
    ("xml", "configuration"),
    ("css", "styles"),
    ("scss", "styles"),
    ("sass", "styles"),
    ("less", "styles"),
    ("styl", "styles"),
    ("png", "assets"),
    ("jpg", "assets"),
    ("jpeg", "assets"),
    ("gif", "assets"),
    ("svg", "assets"),
    ("ico", "assets"),
    ("woff", "assets"),
    ("woff2", "assets"),
    ("ttf", "assets"),
    ("eot", "assets"),
];

/// Top-level directory → group tag
const DIRECTORY_GROUPS: &[(&str, &str)] = &[
    ("public", "static-assets"),
    ("static", "static-assets"),
    ("assets", "static-assets"),
    ("images", "static-assets"),
    ("docs", "documentation"),
    ("doc", "documentation"),
    ("documentation", "documentation"),
    ("config", "configuration"),
    ("configs", "configuration"),
    ("settings", "configuration"),
    ("tests", "tests"),
    ("test", "tests"),
    ("__tests__", "tests"),
    ("spec", "tests"),
    ("specs", "tests"),
    ("styles", "styles"),
    ("css", "styles"),
    ("scss", "styles"),
    ("components", "components"),
    ("component", "components"),
    ("pages", "pages"),
    ("views", "views"),
    ("routes", "routes"),
    ("api", "api"),
    ("services", "services"),
    ("service", "services"),
    ("utils", "utilities"),
    ("util", "utilities"),
    ("helpers", "utilities"),
    ("lib", "libraries"),
    ("libs", "libraries"),
    ("vendor", "vendor"),
    ("node_modules", "vendor"),
];

/// Fragments that mark a path as test-related
const TEST_PATTERNS: &[&str] = &[
    ".test.",
    ".spec.",
    "_test.",
    "_spec.",
    "/test/",
    "/tests/",
    "/spec/",
    "/specs/",
    "/__tests__/",
];

/// Buckets files into logical groups, tag → files
///
/// Deterministic: the returned map iterates in tag order and each bucket
/// preserves the input file order.
pub fn group_files(files: &[FileChange]) -> BTreeMap<String, Vec<FileChange>> {
    let mut groups: BTreeMap<String, Vec<FileChange>> = BTreeMap::new();
    for file in files {
        groups
            .entry(group_tag(&file.path))
            .or_default()
            .push(file.clone());
    }
    groups
}

/// Determines the group tag for one path, first match wins
pub fn group_tag(path: &str) -> String {
    if let Some(tag) = extension_group(path) {
        return tag.to_string();
    }

    if let Some(top) = top_level_dir(path) {
        let lower = top.to_lowercase();
        if let Some((_, tag)) = DIRECTORY_GROUPS.iter().find(|(dir, _)| *dir == lower) {
            return tag.to_string();
        }
        if is_test_path(path) {
            return "tests".to_string();
        }
        return format!("dir-{}", lower);
    }

    if is_test_path(path) {
        return "tests".to_string();
    }

    "miscellaneous".to_string()
}

fn extension_group(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?.to_lowercase();
    if !path.contains('.') || path.ends_with('.') {
        return None;
    }
    EXTENSION_GROUPS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, tag)| *tag)
}

fn top_level_dir(path: &str) -> Option<&str> {
    let mut parts = path.split('/');
    let first = parts.next()?;
    parts.next().map(|_| first)
}

fn is_test_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    TEST_PATTERNS.iter().any(|p| lower.contains(p))
}
