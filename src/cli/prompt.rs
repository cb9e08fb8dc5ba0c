//! Interactive prompts
//!
//! Everything that blocks on stdin lives here: configuration gathering
//! with recommendations, the final plan approval, and the oversize
//! circular-group negotiation. The engine only sees the
//! `OversizeDecision` trait, so tests substitute scripted answers.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::config::{recommend, Recommendations, SplitConfig};
use crate::domain::OversizeDecision;

/// Reads validated answers from stdin
pub struct Prompter;

impl Prompter {
    pub fn new() -> Self {
        Self
    }

    fn read_line(&self) -> Result<String> {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read input")?;
        Ok(line.trim().to_string())
    }

    /// Prompts for a number within bounds, empty input takes the default
    pub fn prompt_usize(&self, prompt: &str, default: usize, min: usize, max: usize) -> Result<usize> {
        loop {
            print!("{} (default: {}): ", prompt, default);
            std::io::stdout().flush().ok();

            let input = self.read_line()?;
            if input.is_empty() {
                return Ok(default);
            }

            match input.parse::<usize>() {
                Ok(value) if value >= min && value <= max => return Ok(value),
                Ok(_) => println!("Please enter a number between {} and {}", min, max),
                Err(_) => println!("Please enter a valid number"),
            }
        }
    }

    /// Prompts for a string, empty input takes the default
    pub fn prompt_string(&self, prompt: &str, default: &str) -> Result<String> {
        print!("{} (default: {}): ", prompt, default);
        std::io::stdout().flush().ok();

        let input = self.read_line()?;
        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input)
        }
    }

    /// Asks a yes/no question; empty input takes `default_yes`
    pub fn confirm(&self, message: &str, default_yes: bool) -> Result<bool> {
        let hint = if default_yes { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{} {}: ", message, hint);
            std::io::stdout().flush().ok();

            match self.read_line()?.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                "" => return Ok(default_yes),
                _ => println!("Please enter 'y' or 'n'"),
            }
        }
    }
}

impl Default for Prompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Gathers configuration interactively, anchored on recommendations for
/// the estimated change size
pub fn configure_interactively(base: &SplitConfig, estimated_files: usize) -> Result<SplitConfig> {
    let prompter = Prompter::new();
    let rec = recommend(estimated_files);

    println!("Configuration for {} changed files:", estimated_files);
    show_recommendations(estimated_files, &rec);

    let max_files = prompter.prompt_usize(
        "Max files per partition?",
        rec.max_files_per_partition,
        1,
        1000,
    )?;
    let max_partitions = prompter.prompt_usize("Max total partitions?", rec.max_partitions, 1, 100)?;

    show_capacity_analysis(max_files, max_partitions, estimated_files);

    let branch_prefix = prompter.prompt_string("Branch prefix?", &base.branch_prefix)?;

    let config = SplitConfig {
        max_files_per_partition: max_files,
        max_partitions,
        branch_prefix,
        ..base.clone()
    };
    config.validate()?;
    Ok(config)
}

fn show_recommendations(file_count: usize, rec: &Recommendations) {
    println!("Recommendations for {} files:", file_count);
    println!("  max partitions:          {}", rec.max_partitions);
    println!("  max files per partition: {}", rec.max_files_per_partition);
    println!("  total capacity:          {} files", rec.total_capacity);
    println!();
}

fn show_capacity_analysis(max_files: usize, max_partitions: usize, estimated: usize) {
    let capacity = max_files * max_partitions;
    println!(
        "Selected capacity: {} files ({} partitions x {} files)",
        capacity, max_partitions, max_files
    );

    if capacity < estimated {
        println!(
            "Warning: capacity ({}) is below the estimated change size ({}); \
             extra partitions will be created as needed",
            capacity, estimated
        );
    } else if capacity > estimated * 2 {
        println!(
            "Note: capacity ({}) is well above the change size ({}); \
             expect many small partitions",
            capacity, estimated
        );
    }
    println!();
}

/// Interactive oversize negotiation: proceed, inspect, or abort
pub struct InteractiveOversize {
    prompter: Prompter,
}

impl InteractiveOversize {
    pub fn new() -> Self {
        Self {
            prompter: Prompter::new(),
        }
    }
}

impl Default for InteractiveOversize {
    fn default() -> Self {
        Self::new()
    }
}

impl OversizeDecision for InteractiveOversize {
    fn approve_oversize(&mut self, files: &[String], size: usize, limit: usize) -> bool {
        println!();
        println!(
            "Found a circular dependency group with {} files (limit: {})",
            size, limit
        );
        println!("Files in the circular group:");
        let preview = 5;
        for file in files.iter().take(preview) {
            println!("  - {}", file);
        }
        if files.len() > preview {
            println!("  ... and {} more files", files.len() - preview);
        }

        println!();
        println!("Options:");
        println!("[1] Proceed with an extended partition");
        println!("[2] Show the full circular group");
        println!("[3] Abort and break the cycle first");

        loop {
            print!("Choose option (1-3): ");
            std::io::stdout().flush().ok();

            let Ok(choice) = self.prompter.read_line() else {
                return false;
            };

            match choice.as_str() {
                "1" => return true,
                "2" => {
                    println!();
                    for file in files {
                        println!("  - {}", file);
                    }
                    println!();
                }
                "3" => return false,
                _ => println!("Please choose 1, 2, or 3"),
            }
        }
    }
}

/// Unattended oversize policy: proceed, but say so on stderr
pub struct WarnAndProceed;

impl OversizeDecision for WarnAndProceed {
    fn approve_oversize(&mut self, _files: &[String], size: usize, limit: usize) -> bool {
        eprintln!(
            "Warning: accepting circular dependency group of {} files (limit {}) in \
             non-interactive mode",
            size, limit
        );
        true
    }
}
