//! File change and dependency edge models
//!
//! These are the two inputs to the partition engine: `FileChange` records
//! produced by change discovery, and `Dependency` edges produced by the
//! analyzer plugins. Both serialize as camelCase JSON because they travel
//! over the analyzer stdin/stdout protocol.

use serde::{Deserialize, Serialize};

/// Classification of a change made to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Add,
    Modify,
    Delete,
    Rename,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Add => "ADD",
            ChangeType::Modify => "MODIFY",
            ChangeType::Delete => "DELETE",
            ChangeType::Rename => "RENAME",
        }
    }
}

/// A single file change between the target and source branches
///
/// Identity is `path` (slash-normalised, relative to the project root).
/// Context files carry `is_changed = false`; they exist only so analyzers
/// can resolve imports and are never partitioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    /// Slash-normalised path relative to the project root
    pub path: String,

    /// How the file changed
    pub change_type: ChangeType,

    /// Full content on the source branch (empty for DELETE)
    #[serde(default)]
    pub content: String,

    /// Lines added per the diff stat
    #[serde(default)]
    pub lines_added: u32,

    /// Lines deleted per the diff stat
    #[serde(default)]
    pub lines_deleted: u32,

    /// False for context files included only for analyzer resolution
    #[serde(default)]
    pub is_changed: bool,

    /// Previous path, present iff this is a RENAME
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
}

impl FileChange {
    /// Creates a changed file record
    pub fn changed(path: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            path: path.into(),
            change_type,
            content: String::new(),
            lines_added: 0,
            lines_deleted: 0,
            is_changed: true,
            old_path: None,
        }
    }

    /// Creates a context file record (never partitioned)
    pub fn context(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            change_type: ChangeType::Modify,
            content: content.into(),
            lines_added: 0,
            lines_deleted: 0,
            is_changed: false,
            old_path: None,
        }
    }

    /// Checks the structural invariants of a change record
    pub fn is_valid(&self) -> bool {
        if !is_valid_path(&self.path) {
            return false;
        }
        match self.change_type {
            ChangeType::Rename => self
                .old_path
                .as_deref()
                .map(is_valid_path)
                .unwrap_or(false),
            ChangeType::Delete => self.content.is_empty(),
            _ => true,
        }
    }
}

/// Validates a repository-relative file path
///
/// Rejects empty paths, paths over 4096 bytes, NUL/CR/LF bytes, and any
/// `..` traversal segment.
pub fn is_valid_path(path: &str) -> bool {
    if path.is_empty() || path.len() > 4096 {
        return false;
    }
    if path.contains('\0') || path.contains('\r') || path.contains('\n') {
        return false;
    }
    !path.split('/').any(|segment| segment == "..")
}

/// How strongly one file depends on another
///
/// The engine currently treats all strengths alike for ordering; the value
/// is carried through for future weighting policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependencyStrength {
    /// Import/export relationships that break compilation
    Critical,
    /// Function calls that break at runtime
    Strong,
    /// Type references that break features
    Moderate,
    /// Similar patterns; quality only
    Weak,
    /// Mutual dependency
    Circular,
}

/// A directed dependency edge: `from` references `to`
///
/// `from` must not precede `to` in the partition order. The edge is *live*
/// only when both endpoints are changed files; the graph builder drops the
/// rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub from: String,
    pub to: String,

    /// Free-form tag: `import`, `require`, `dynamic-import`, …
    #[serde(rename = "type")]
    pub kind: String,

    pub strength: DependencyStrength,

    /// Line number where the dependency occurs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,

    /// Code snippet around the dependency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Dependency {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: impl Into<String>,
        strength: DependencyStrength,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind: kind.into(),
            strength,
            line: None,
            context: None,
        }
    }
}
