//! # prsplit
//!
//! A CLI tool that splits one large branch into an ordered sequence of
//! smaller branches, each small enough to review, respecting the code
//! dependencies between the changed files.
//!
//! ## Overview
//!
//! Given a source branch and a target branch, prsplit diffs them, asks
//! per-language analyzer plugins for file-to-file dependency edges, and
//! partitions the changed files so that every partition only depends on
//! partitions with smaller ids. Each partition becomes a branch stacked on
//! its prerequisites, ready to merge in id order without breaking
//! compilation.
//!
//! ## Architecture
//!
//! The crate is organized into five modules:
//!
//! - [`domain`] - The partition engine: graph, SCCs, depth, assembly,
//!   naming, validation. Pure and deterministic; no I/O.
//! - [`plugin`] - Analyzer discovery and the stdin/stdout JSON protocol,
//!   with a regex fallback scanner.
//! - [`git`] - Change discovery (diff parsing, context files) and the
//!   branch executor with rollback.
//! - [`config`] - Defaults, bounds, YAML loading, capacity
//!   recommendations.
//! - [`cli`] - Commands, prompts, and output formatting.
//!
//! ## Data Flow
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌────────────┐    ┌───────────┐
//! │  git diff │───▶│ analyzers │───▶│ partition  │───▶│  branch   │
//! │ (changes) │    │  (edges)  │    │   engine   │    │ executor  │
//! └───────────┘    └───────────┘    └────────────┘    └───────────┘
//!                                         │
//!                                         ▼
//!                                   ┌────────────┐
//!                                   │ validation │
//!                                   └────────────┘
//! ```
//!
//! ## Guarantees
//!
//! 1. **Exhaustive**: every changed file lands in exactly one partition
//! 2. **Ordered**: a file is always partitioned after everything it
//!    depends on
//! 3. **Atomic cycles**: circular dependency groups stay in one partition
//! 4. **Deterministic**: the same diff and edges produce the same plan
//!
//! ## Example Usage
//!
//! ```bash
//! # Split a feature branch against main, interactively
//! prsplit break feature/big-refactor
//!
//! # Unattended, with explicit limits and no push
//! prsplit break feature/big-refactor --target main --max-size 10 \
//!     --non-interactive --no-push
//!
//! # Clean up afterwards
//! prsplit rollback pr-split
//! ```

pub mod domain;
pub mod plugin;
pub mod git;
pub mod config;
pub mod cli;

pub use config::SplitConfig;
pub use domain::{ChangeType, Dependency, DependencyStrength, FileChange, Partition, Plan};
