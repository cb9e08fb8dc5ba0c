//! # Partition Engine
//!
//! Core logic for splitting a change set into dependency-ordered
//! partitions, free of I/O concerns.
//!
//! ## Key Types
//!
//! - [`FileChange`] / [`Dependency`] - the two inputs: changed files and
//!   directed dependency edges between them
//! - [`DependencyGraph`] - live edges between changed files
//! - [`Plan`] / [`Partition`] - the ordered output, one partition per
//!   future branch
//! - [`ValidationReport`] - post-assembly contract checks
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌──────────────┐    ┌───────────────┐
//! │ FileChanges │───▶│  Dependency  │───▶│  SCCs + depth │
//! │  (changed)  │    │    graph     │    │ (condensation)│
//! └─────────────┘    └──────────────┘    └───────────────┘
//!                                               │
//!                                               ▼
//!                    ┌──────────────┐    ┌───────────────┐
//!                    │  Validation  │◀───│   Assembler   │
//!                    │    report    │    │ (3 phases)    │
//!                    └──────────────┘    └───────────────┘
//! ```
//!
//! ## Invariants
//!
//! - Every changed file lands in exactly one partition
//! - A circular group (SCC of size >= 2) is never split
//! - Every dependency edge points at a partition with a smaller id
//! - Identical inputs produce identical plans
//!
//! ## Example
//!
//! ```
//! use prsplit::config::SplitConfig;
//! use prsplit::domain::{
//!     create_plan, ApproveAll, ChangeType, Dependency, DependencyStrength, FileChange,
//! };
//!
//! let files = vec![
//!     FileChange::changed("app.ts", ChangeType::Modify),
//!     FileChange::changed("util.ts", ChangeType::Modify),
//! ];
//! let edges = vec![Dependency::new(
//!     "app.ts",
//!     "util.ts",
//!     "import",
//!     DependencyStrength::Critical,
//! )];
//!
//! let outcome = create_plan(&files, &edges, &SplitConfig::default(), &mut ApproveAll).unwrap();
//!
//! // util.ts has no dependencies, so it is partitioned first.
//! assert_eq!(outcome.plan.partitions[0].files[0].path, "util.ts");
//! ```

mod change;
mod graph;
mod scc;
mod depth;
mod partition;
mod assembler;
mod grouper;
mod namer;
mod validator;

pub use change::{is_valid_path, ChangeType, Dependency, DependencyStrength, FileChange};
pub use graph::DependencyGraph;
pub use scc::{circular_groups, find_components, Component};
pub use depth::dependency_depths;
pub use partition::{Partition, Plan, PlanMetadata};
pub use assembler::{create_plan, ApproveAll, AssemblyError, OversizeDecision, PlanOutcome};
pub use grouper::{group_files, group_tag};
pub use namer::{partition_description, partition_name, sanitize_slug};
pub use validator::{
    validate_plan, ValidationKind, ValidationReport, ValidationResult, ValidationStatus,
};
