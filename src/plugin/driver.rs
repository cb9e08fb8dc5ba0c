//! Analyzer discovery and execution
//!
//! Discovers analyzers from a `plugins/` directory, routes changed files
//! to them by extension, runs one process per analyzer with the protocol
//! documents on stdin/stdout, and aggregates the reported edges into a
//! deterministic list. A crashing or garbled analyzer degrades to the
//! regex fallback for its file group; it never aborts the plan.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use anyhow::{Context, Result};

use super::fallback::scan_imports;
use super::manifest::PluginManifest;
use super::protocol::{AnalyzerInput, AnalyzerOutput};
use crate::domain::{Dependency, FileChange};

/// A discovered, validated analyzer
#[derive(Debug, Clone)]
pub struct LoadedPlugin {
    pub manifest: PluginManifest,

    /// Resolved executable path
    pub executable: PathBuf,
}

/// Aggregated result of one analysis pass
#[derive(Debug, Default)]
pub struct AnalysisReport {
    /// Deduplicated edges, sorted by (from, to, kind)
    pub dependencies: Vec<Dependency>,

    /// Informational notes for verbose output
    pub notes: Vec<String>,

    /// Analyzer failures that triggered the fallback
    pub errors: Vec<String>,
}

/// Runs language analyzers over a change set
#[derive(Debug, Default)]
pub struct AnalyzerDriver {
    /// Discovered analyzers, keyed by name for deterministic routing
    plugins: BTreeMap<String, LoadedPlugin>,
}

impl AnalyzerDriver {
    /// Discovers analyzers in a plugins directory
    ///
    /// Invalid plugins are skipped with a note; discovery itself never
    /// fails.
    pub fn discover(plugin_dir: &Path) -> (Self, Vec<String>) {
        let mut driver = Self::default();
        let mut notes = Vec::new();

        if !plugin_dir.is_dir() {
            notes.push(format!(
                "plugins directory not found: {}",
                plugin_dir.display()
            ));
            return (driver, notes);
        }

        let mut entries: Vec<PathBuf> = match std::fs::read_dir(plugin_dir) {
            Ok(entries) => entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect(),
            Err(err) => {
                notes.push(format!(
                    "failed to read plugins directory {}: {}",
                    plugin_dir.display(),
                    err
                ));
                return (driver, notes);
            }
        };
        entries.sort();

        for dir in entries {
            match Self::load_plugin(&dir) {
                Ok(plugin) => {
                    notes.push(format!(
                        "discovered plugin: {} v{} ({})",
                        plugin.manifest.name,
                        plugin.manifest.version,
                        plugin.manifest.extensions.join(" ")
                    ));
                    driver
                        .plugins
                        .insert(plugin.manifest.name.clone(), plugin);
                }
                Err(err) => {
                    notes.push(format!("skipping plugin in {}: {:#}", dir.display(), err));
                }
            }
        }

        (driver, notes)
    }

    fn load_plugin(dir: &Path) -> Result<LoadedPlugin> {
        let manifest = PluginManifest::load(dir)?;

        let executable = manifest.executable_path(dir);
        if !executable.exists() {
            anyhow::bail!("executable not found: {}", executable.display());
        }
        if !manifest.runtime_available() {
            anyhow::bail!(
                "runtime '{}' not found on PATH",
                manifest.runtime.as_deref().unwrap_or_default()
            );
        }

        Ok(LoadedPlugin {
            manifest,
            executable,
        })
    }

    /// The default plugins directory: next to the executable, falling back
    /// to `plugins/` under the working directory
    pub fn default_plugin_dir() -> PathBuf {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let candidate = dir.join("plugins");
                if candidate.is_dir() {
                    return candidate;
                }
            }
        }
        PathBuf::from("plugins")
    }

    /// Discovered analyzers in name order
    pub fn plugins(&self) -> impl Iterator<Item = &LoadedPlugin> {
        self.plugins.values()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Runs every applicable analyzer over the change set
    ///
    /// Files route to the first analyzer (in name order) that claims their
    /// extension; files nobody claims are skipped with a note.
    pub fn analyze(&self, files: &[FileChange], project_root: &Path) -> AnalysisReport {
        let mut report = AnalysisReport::default();

        let mut groups: BTreeMap<&str, Vec<&FileChange>> = BTreeMap::new();
        let mut unclaimed = 0usize;
        for file in files {
            match self.plugin_for(&file.path) {
                Some(name) => groups.entry(name).or_default().push(file),
                None => {
                    if file.is_changed {
                        unclaimed += 1;
                    }
                }
            }
        }
        if unclaimed > 0 {
            report.notes.push(format!(
                "{} changed files have no matching analyzer",
                unclaimed
            ));
        }

        let mut raw_edges = Vec::new();
        for (name, group) in &groups {
            if !group.iter().any(|f| f.is_changed) {
                continue;
            }

            let plugin = &self.plugins[*name];
            let started = Instant::now();
            match self.execute(plugin, group, project_root) {
                Ok(output) => {
                    report.notes.push(format!(
                        "{} found {} dependencies in {:?}",
                        name,
                        output.dependencies.len(),
                        started.elapsed()
                    ));
                    for error in output.errors {
                        report.errors.push(format!("{}: {}", name, error));
                    }
                    raw_edges.extend(output.dependencies);
                }
                Err(err) => {
                    report
                        .errors
                        .push(format!("{} failed, using fallback analysis: {:#}", name, err));
                    let owned: Vec<FileChange> = group.iter().map(|f| (*f).clone()).collect();
                    raw_edges.extend(scan_imports(&owned));
                }
            }
        }

        let known: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
        report.dependencies = aggregate_edges(raw_edges, &known);
        report
    }

    /// Runs the regex fallback across the whole change set
    ///
    /// Used when no analyzers are installed at all.
    pub fn fallback_analyze(&self, files: &[FileChange]) -> AnalysisReport {
        let known: BTreeSet<&str> = files.iter().map(|f| f.path.as_str()).collect();
        AnalysisReport {
            dependencies: aggregate_edges(scan_imports(files), &known),
            notes: vec!["no analyzers installed, using fallback import scan".to_string()],
            errors: vec![],
        }
    }

    /// Finds the analyzer claiming a file's extension
    fn plugin_for(&self, path: &str) -> Option<&str> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))?;

        self.plugins
            .iter()
            .find(|(_, p)| p.manifest.handles_extension(&ext))
            .map(|(name, _)| name.as_str())
    }

    /// Runs one analyzer process over its file group
    fn execute(
        &self,
        plugin: &LoadedPlugin,
        group: &[&FileChange],
        project_root: &Path,
    ) -> Result<AnalyzerOutput> {
        let input = AnalyzerInput {
            changed_files: group
                .iter()
                .filter(|f| f.is_changed)
                .map(|f| (*f).clone())
                .collect(),
            project_files: group
                .iter()
                .filter(|f| !f.is_changed)
                .map(|f| (*f).clone())
                .collect(),
            project_root: project_root.to_string_lossy().into_owned(),
        };
        let input_json =
            serde_json::to_vec(&input).context("Failed to serialize analyzer input")?;

        let (command, args) = plugin.manifest.launch_command(&plugin.executable);
        let mut child = Command::new(&command)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn analyzer: {}", command))?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(&input_json)
                .context("Failed to write analyzer input")?;
        }
        drop(child.stdin.take());

        let output = child
            .wait_with_output()
            .context("Failed to wait for analyzer")?;

        if !output.status.success() {
            anyhow::bail!(
                "analyzer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        serde_json::from_slice(&output.stdout).context("Failed to parse analyzer output")
    }
}

/// Normalises raw analyzer edges: drops edges pointing outside the known
/// file set, deduplicates by (from, to, kind), sorts for determinism
pub(crate) fn aggregate_edges(
    edges: Vec<Dependency>,
    known_paths: &BTreeSet<&str>,
) -> Vec<Dependency> {
    let mut seen = BTreeSet::new();
    let mut result: Vec<Dependency> = edges
        .into_iter()
        .filter(|e| known_paths.contains(e.to.as_str()))
        .filter(|e| seen.insert((e.from.clone(), e.to.clone(), e.kind.clone())))
        .collect();

    result.sort_by(|a, b| {
        (a.from.as_str(), a.to.as_str(), a.kind.as_str())
            .cmp(&(b.from.as_str(), b.to.as_str(), b.kind.as_str()))
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeType, DependencyStrength};
    use std::fs;
    use tempfile::TempDir;

    fn write_plugin(root: &Path, dir_name: &str, manifest: &str, script: &str) {
        let dir = root.join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("plugin.json"), manifest).unwrap();
        fs::write(dir.join("run.sh"), script).unwrap();
    }

    fn changed_with(path: &str, content: &str) -> FileChange {
        FileChange {
            content: content.to_string(),
            ..FileChange::changed(path, ChangeType::Modify)
        }
    }

    #[test]
    fn discovery_skips_invalid_plugins() {
        let dir = TempDir::new().unwrap();
        write_plugin(
            dir.path(),
            "good",
            r#"{"name": "good", "executable": "run.sh", "extensions": [".zz"], "runtime": "sh"}"#,
            "exit 0\n",
        );
        write_plugin(dir.path(), "broken", "{not json", "exit 0\n");
        fs::create_dir_all(dir.path().join("empty")).unwrap();

        let (driver, notes) = AnalyzerDriver::discover(dir.path());
        assert_eq!(driver.plugins().count(), 1);
        assert!(notes.iter().any(|n| n.contains("discovered plugin: good")));
        assert!(notes.iter().any(|n| n.contains("skipping plugin")));
    }

    #[test]
    fn missing_directory_is_a_note_not_an_error() {
        let dir = TempDir::new().unwrap();
        let (driver, notes) = AnalyzerDriver::discover(&dir.path().join("nope"));

        assert!(driver.is_empty());
        assert!(notes[0].contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn analyzer_output_is_aggregated() {
        let dir = TempDir::new().unwrap();
        let response = r#"{"dependencies": [
            {"from": "b.zz", "to": "a.zz", "type": "import", "strength": "CRITICAL"},
            {"from": "b.zz", "to": "a.zz", "type": "import", "strength": "CRITICAL"},
            {"from": "b.zz", "to": "missing.zz", "type": "import", "strength": "WEAK"}
        ], "errors": ["one warning"]}"#;
        write_plugin(
            dir.path(),
            "zz",
            r#"{"name": "zz-analyzer", "executable": "run.sh", "extensions": [".zz"], "runtime": "sh"}"#,
            &format!("cat > /dev/null\nprintf '%s' '{}'\n", response),
        );

        let (driver, _) = AnalyzerDriver::discover(dir.path());
        let files = vec![changed_with("a.zz", ""), changed_with("b.zz", "")];
        let report = driver.analyze(&files, Path::new("/repo"));

        // Duplicate collapsed, unknown target dropped, plugin error surfaced.
        assert_eq!(report.dependencies.len(), 1);
        assert_eq!(report.dependencies[0].from, "b.zz");
        assert!(report.errors.iter().any(|e| e.contains("one warning")));
    }

    #[cfg(unix)]
    #[test]
    fn crashing_analyzer_falls_back_to_import_scan() {
        let dir = TempDir::new().unwrap();
        write_plugin(
            dir.path(),
            "ts",
            r#"{"name": "ts-analyzer", "executable": "run.sh", "extensions": [".ts"], "runtime": "sh"}"#,
            "exit 3\n",
        );

        let (driver, _) = AnalyzerDriver::discover(dir.path());
        let files = vec![
            changed_with("src/app.ts", "import { u } from \"./util\";\n"),
            changed_with("src/util.ts", ""),
        ];
        let report = driver.analyze(&files, Path::new("/repo"));

        assert!(report.errors.iter().any(|e| e.contains("fallback")));
        assert_eq!(report.dependencies.len(), 1);
        assert_eq!(report.dependencies[0].to, "src/util.ts");
    }

    #[test]
    fn unclaimed_files_are_noted() {
        let driver = AnalyzerDriver::default();
        let files = vec![changed_with("a.rs", "")];
        let report = driver.analyze(&files, Path::new("/repo"));

        assert!(report.dependencies.is_empty());
        assert!(report.notes[0].contains("no matching analyzer"));
    }

    #[test]
    fn aggregate_sorts_deterministically() {
        let known: BTreeSet<&str> = ["a", "b", "c"].into_iter().collect();
        let edges = vec![
            Dependency::new("c", "a", "import", DependencyStrength::Strong),
            Dependency::new("a", "b", "require", DependencyStrength::Strong),
            Dependency::new("a", "b", "import", DependencyStrength::Strong),
        ];

        let result = aggregate_edges(edges, &known);
        let keys: Vec<(&str, &str)> = result
            .iter()
            .map(|e| (e.from.as_str(), e.kind.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("a", "import"), ("a", "require"), ("c", "import")]
        );
    }
}
