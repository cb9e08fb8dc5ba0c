//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{break_cmd, plugins_cmd, rollback_cmd};

#[derive(Parser)]
#[command(name = "prsplit")]
#[command(author, version, about = "Split a large branch into dependency-ordered partitions")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Break a large branch into smaller dependency-ordered branches
    Break {
        /// The branch to split
        source_branch: String,

        /// Target branch the partitions merge into
        #[arg(long, short = 't')]
        target: Option<String>,

        /// Prefix for generated branch names
        #[arg(long, short = 'p')]
        prefix: Option<String>,

        /// Maximum files per partition
        #[arg(long, short = 's')]
        max_size: Option<usize>,

        /// Maximum dependency depth to budget partitions for
        #[arg(long, short = 'd')]
        max_depth: Option<usize>,

        /// YAML config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Run without prompts using defaults
        #[arg(long)]
        non_interactive: bool,

        /// Do not push created branches to origin
        #[arg(long)]
        no_push: bool,

        /// Directory to discover analyzer plugins in
        #[arg(long)]
        plugin_dir: Option<PathBuf>,
    },

    /// Delete branches created by a previous split, by prefix
    Rollback {
        /// Branch prefix to match
        prefix: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// List discovered analyzer plugins
    Plugins {
        /// Directory to discover analyzer plugins in
        #[arg(long)]
        plugin_dir: Option<PathBuf>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    match cli.command {
        Commands::Break {
            source_branch,
            target,
            prefix,
            max_size,
            max_depth,
            config,
            non_interactive,
            no_push,
            plugin_dir,
        } => break_cmd::run(
            break_cmd::BreakArgs {
                source_branch,
                target,
                prefix,
                max_size,
                max_depth,
                config,
                non_interactive,
                no_push,
                plugin_dir,
            },
            &output,
        )?,

        Commands::Rollback { prefix, yes } => rollback_cmd::run(&prefix, yes, &output)?,

        Commands::Plugins { plugin_dir } => plugins_cmd::run(plugin_dir, &output)?,
    }

    Ok(())
}
