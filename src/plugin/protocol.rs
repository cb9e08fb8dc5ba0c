//! Analyzer protocol types
//!
//! Analyzers communicate via one JSON document on stdin and one on stdout.
//! Field names are camelCase on the wire so plugins can be written in any
//! language without a field-mapping layer.

use serde::{Deserialize, Serialize};

use crate::domain::{Dependency, FileChange};

/// The document written to an analyzer's stdin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerInput {
    /// Files changed between the target and source branches
    pub changed_files: Vec<FileChange>,

    /// Unchanged files provided so imports can be resolved
    pub project_files: Vec<FileChange>,

    /// Absolute path of the repository root
    pub project_root: String,
}

/// The document read from an analyzer's stdout
///
/// All fields default so a sparse plugin response still parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerOutput {
    pub dependencies: Vec<Dependency>,
    pub metadata: AnalyzerMetadata,
    pub errors: Vec<String>,
}

/// Bookkeeping an analyzer reports about its run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerMetadata {
    pub files_analyzed: usize,
    pub analysis_time: String,
    pub plugin_name: String,
    pub plugin_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeType, DependencyStrength};

    #[test]
    fn input_serializes_camel_case() {
        let input = AnalyzerInput {
            changed_files: vec![FileChange::changed("a.py", ChangeType::Add)],
            project_files: vec![FileChange::context("b.py", "x = 1")],
            project_root: "/repo".to_string(),
        };

        let json = serde_json::to_string(&input).unwrap();
        assert!(json.contains("\"changedFiles\""));
        assert!(json.contains("\"projectFiles\""));
        assert!(json.contains("\"projectRoot\":\"/repo\""));
    }

    #[test]
    fn sparse_output_parses_with_defaults() {
        let output: AnalyzerOutput = serde_json::from_str("{}").unwrap();
        assert!(output.dependencies.is_empty());
        assert!(output.errors.is_empty());
        assert!(output.metadata.plugin_name.is_empty());
    }

    #[test]
    fn full_output_roundtrips() {
        let output = AnalyzerOutput {
            dependencies: vec![Dependency::new(
                "a.py",
                "b.py",
                "import",
                DependencyStrength::Critical,
            )],
            metadata: AnalyzerMetadata {
                files_analyzed: 2,
                analysis_time: "12ms".to_string(),
                plugin_name: "python-analyzer".to_string(),
                plugin_version: "1.0.0".to_string(),
            },
            errors: vec!["could not parse c.py".to_string()],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"filesAnalyzed\":2"));

        let parsed: AnalyzerOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.dependencies.len(), 1);
        assert_eq!(parsed.metadata.plugin_name, "python-analyzer");
    }
}
