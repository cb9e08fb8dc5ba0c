//! Partition naming
//!
//! Derives a branch-safe slug and a human-readable description from a
//! partition's file set. Precedence: shared directory, then dominant file
//! extension, then functionality keywords found in the paths, then a
//! generic fallback. Slugs always match `[a-z0-9][a-z0-9-]*` and stay
//! within 30 characters.

use std::collections::BTreeMap;

use super::change::FileChange;

/// Dominant extension → slug
const EXTENSION_NAMES: &[(&str, &str)] = &[
    ("tsx", "components"),
    ("jsx", "components"),
    ("ts", "typescript"),
    ("js", "javascript"),
    ("py", "python"),
    ("go", "golang"),
    ("css", "styles"),
    ("scss", "styles"),
    ("sass", "styles"),
    ("json", "config"),
    ("yaml", "config"),
    ("yml", "config"),
    ("md", "docs"),
    ("html", "markup"),
];

/// Keyword groups scanned across all paths of a partition
const KEYWORD_GROUPS: &[(&[&str], &str)] = &[
    (&["auth", "authentication", "login", "signin"], "authentication"),
    (&["user", "profile", "account"], "user-management"),
    (&["api", "endpoint", "route", "handler"], "api"),
    (&["database", "db", "model", "schema"], "database"),
    (&["component", "ui", "interface"], "components"),
    (&["util", "helper", "common"], "utilities"),
    (&["test", "spec", "__test__"], "tests"),
    (&["config", "setting", "constant"], "configuration"),
    (&["style", "css", "theme"], "styling"),
    (&["service", "client", "provider"], "services"),
    (&["hook", "context", "state"], "state-management"),
    (&["layout", "template", "page"], "layout"),
    (&["form", "input", "validation"], "forms"),
    (&["chart", "graph", "visualization"], "visualization"),
    (&["admin", "dashboard", "panel"], "admin"),
];

/// Generates the slug for a partition's file set
pub fn partition_name(files: &[FileChange]) -> String {
    if files.is_empty() {
        return "empty".to_string();
    }

    if let Some(dir) = common_directory(files) {
        return sanitize_slug(&dir);
    }

    if let Some(name) = dominant_extension(files) {
        return name.to_string();
    }

    if let Some(name) = functionality_keyword(files) {
        return name.to_string();
    }

    format!("partition-{}-files", files.len())
}

/// Generates the human-readable description for a partition's file set
pub fn partition_description(files: &[FileChange]) -> String {
    let name = partition_name(files);
    format!("{} ({} files)", title_case(&name), files.len())
}

/// Finds a directory shared by more than half the files
///
/// Both the full directory and the top-level directory of each path are
/// counted; the most common qualifying one wins, smallest name first on
/// ties so the result is stable.
fn common_directory(files: &[FileChange]) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for file in files {
        let Some(dir) = file.path.rsplit_once('/').map(|(d, _)| d) else {
            continue;
        };
        *counts.entry(dir).or_default() += 1;

        let top = dir.split('/').next().unwrap_or(dir);
        if top != dir {
            *counts.entry(top).or_default() += 1;
        }
    }

    let threshold = files.len() / 2;
    let mut best: Option<(&str, usize)> = None;
    for (dir, count) in counts {
        if count > threshold && best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((dir, count));
        }
    }

    best.map(|(dir, _)| dir.to_string())
}

/// Names the partition after an extension shared by more than half the files
fn dominant_extension(files: &[FileChange]) -> Option<&'static str> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for file in files {
        if let Some((stem, ext)) = file.path.rsplit_once('.') {
            if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') {
                *counts.entry(ext.to_lowercase()).or_default() += 1;
            }
        }
    }

    let threshold = files.len() / 2;
    for (ext, count) in counts {
        if count > threshold {
            if let Some((_, name)) = EXTENSION_NAMES.iter().find(|(e, _)| *e == ext) {
                return Some(name);
            }
        }
    }
    None
}

/// Matches known functionality keywords across all paths
///
/// A group wins with two keyword hits, or a single hit when the file set
/// is small (at most 5 files).
fn functionality_keyword(files: &[FileChange]) -> Option<&'static str> {
    let haystack = files
        .iter()
        .map(|f| f.path.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    for (keywords, name) in KEYWORD_GROUPS {
        let matches = keywords.iter().filter(|k| haystack.contains(**k)).count();
        if matches >= 2 || (matches >= 1 && files.len() <= 5) {
            return Some(name);
        }
    }
    None
}

/// Cleans a candidate name into a branch-safe slug
///
/// Every character outside `[a-z0-9]` becomes a dash; runs collapse; the
/// result is trimmed, lowercased, capped at 30 characters, and never empty.
pub fn sanitize_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    let mut slug = slug.trim_matches('-').to_string();
    if slug.len() > 30 {
        slug.truncate(30);
        slug = slug.trim_matches('-').to_string();
    }

    if slug.is_empty() {
        "files".to_string()
    } else {
        slug
    }
}

/// Capitalizes each dash- or space-separated word
fn title_case(name: &str) -> String {
    name.split(['-', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
