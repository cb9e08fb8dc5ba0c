//! The `plugins` command

use std::path::PathBuf;

use anyhow::Result;

use super::output::Output;
use crate::plugin::AnalyzerDriver;

/// Lists discovered analyzers
pub fn run(plugin_dir: Option<PathBuf>, output: &Output) -> Result<()> {
    let dir = plugin_dir.unwrap_or_else(AnalyzerDriver::default_plugin_dir);
    output.verbose_ctx("plugins", &format!("scanning {}", dir.display()));

    let (driver, notes) = AnalyzerDriver::discover(&dir);
    for note in &notes {
        output.verbose_ctx("plugins", note);
    }

    if output.is_json() {
        let items: Vec<_> = driver
            .plugins()
            .map(|p| {
                serde_json::json!({
                    "name": p.manifest.name,
                    "version": p.manifest.version,
                    "extensions": p.manifest.extensions,
                    "runtime": p.manifest.runtime,
                    "executable": p.executable,
                })
            })
            .collect();
        output.data(&items);
        return Ok(());
    }

    if driver.is_empty() {
        println!("No analyzers found in {}", dir.display());
        println!("Create one as <dir>/<name>/plugin.json with an executable.");
        return Ok(());
    }

    println!("{:<24} {:<10} EXTENSIONS", "NAME", "VERSION");
    println!("{}", "-".repeat(60));
    for plugin in driver.plugins() {
        println!(
            "{:<24} {:<10} {}",
            plugin.manifest.name,
            plugin.manifest.version,
            plugin.manifest.extensions.join(" ")
        );
    }

    Ok(())
}
