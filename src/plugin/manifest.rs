//! Plugin manifests
//!
//! Each analyzer lives in its own directory under `plugins/` with a
//! `plugin.json` manifest declaring its name, executable, and the file
//! extensions it handles. The runtime used to launch the executable is
//! either declared explicitly or inferred from the executable's extension.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// The `plugin.json` manifest of one analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,

    /// Executable path, absolute or relative to the plugin directory
    pub executable: String,

    /// File extensions this analyzer handles, with leading dot (".py")
    pub extensions: Vec<String>,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
}

impl PluginManifest {
    /// Loads and validates the manifest in a plugin directory
    pub fn load(plugin_dir: &Path) -> Result<Self> {
        let manifest_path = plugin_dir.join("plugin.json");
        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;

        let manifest: PluginManifest = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("plugin name is required");
        }
        if self.executable.is_empty() {
            bail!("plugin executable is required");
        }
        if self.extensions.is_empty() {
            bail!("plugin must declare supported extensions");
        }
        Ok(())
    }

    /// Resolves the executable path against the plugin directory
    pub fn executable_path(&self, plugin_dir: &Path) -> PathBuf {
        let path = Path::new(&self.executable);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            plugin_dir.join(path)
        }
    }

    /// True when this analyzer handles the extension (".py" form)
    pub fn handles_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// The command used to launch the executable
    ///
    /// An explicit `runtime` wins; otherwise `.js` runs under node and
    /// `.py` under python3, and anything else executes directly.
    pub fn launch_command(&self, executable: &Path) -> (String, Vec<String>) {
        if let Some(runtime) = &self.runtime {
            return (
                runtime.clone(),
                vec![executable.to_string_lossy().into_owned()],
            );
        }

        match executable.extension().and_then(|e| e.to_str()) {
            Some("js") => (
                "node".to_string(),
                vec![executable.to_string_lossy().into_owned()],
            ),
            Some("py") => (
                "python3".to_string(),
                vec![executable.to_string_lossy().into_owned()],
            ),
            _ => (executable.to_string_lossy().into_owned(), vec![]),
        }
    }

    /// Checks that the declared runtime resolves on PATH
    pub fn runtime_available(&self) -> bool {
        match &self.runtime {
            Some(runtime) => on_path(runtime),
            None => true,
        }
    }
}

/// Looks an executable name up on PATH
fn on_path(name: &str) -> bool {
    if name.contains('/') {
        return Path::new(name).exists();
    }

    let Ok(path_var) = std::env::var("PATH") else {
        return false;
    };

    std::env::split_paths(&path_var).any(|dir| {
        let candidate = dir.join(name);
        candidate.is_file()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::write(dir.join("plugin.json"), json).unwrap();
    }

    #[test]
    fn valid_manifest_loads() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"{
                "name": "python-analyzer",
                "executable": "analyzer.py",
                "extensions": [".py", ".pyi"],
                "version": "1.0.0",
                "runtime": "python3"
            }"#,
        );

        let manifest = PluginManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.name, "python-analyzer");
        assert!(manifest.handles_extension(".py"));
        assert!(!manifest.handles_extension(".ts"));
        assert_eq!(
            manifest.executable_path(dir.path()),
            dir.path().join("analyzer.py")
        );
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(PluginManifest::load(dir.path()).is_err());
    }

    #[test]
    fn required_fields_are_enforced() {
        let dir = TempDir::new().unwrap();

        write_manifest(dir.path(), r#"{"name": "", "executable": "x", "extensions": [".ts"]}"#);
        assert!(PluginManifest::load(dir.path()).is_err());

        write_manifest(dir.path(), r#"{"name": "x", "executable": "x", "extensions": []}"#);
        assert!(PluginManifest::load(dir.path()).is_err());

        write_manifest(dir.path(), "{not json");
        assert!(PluginManifest::load(dir.path()).is_err());
    }

    #[test]
    fn runtime_inference_from_extension() {
        let manifest = PluginManifest {
            name: "x".into(),
            executable: "a.js".into(),
            extensions: vec![".ts".into()],
            version: String::new(),
            runtime: None,
            description: None,
            author: None,
            homepage: None,
        };

        let (cmd, args) = manifest.launch_command(Path::new("/p/a.js"));
        assert_eq!(cmd, "node");
        assert_eq!(args, vec!["/p/a.js"]);

        let (cmd, _) = manifest.launch_command(Path::new("/p/a.py"));
        assert_eq!(cmd, "python3");

        let (cmd, args) = manifest.launch_command(Path::new("/p/analyzer"));
        assert_eq!(cmd, "/p/analyzer");
        assert!(args.is_empty());
    }

    #[test]
    fn explicit_runtime_wins() {
        let manifest = PluginManifest {
            name: "x".into(),
            executable: "a.js".into(),
            extensions: vec![".ts".into()],
            version: String::new(),
            runtime: Some("deno".into()),
            description: None,
            author: None,
            homepage: None,
        };

        let (cmd, _) = manifest.launch_command(Path::new("/p/a.js"));
        assert_eq!(cmd, "deno");
    }
}
