//! # Analyzer Plugins
//!
//! Language analysis is delegated to external processes, one per
//! language, discovered from a `plugins/` directory. Each plugin directory
//! carries a `plugin.json` manifest naming the executable and the file
//! extensions it handles.
//!
//! ## Protocol
//!
//! One JSON document in on stdin, one JSON document out on stdout:
//!
//! ```text
//! stdin:  { "changedFiles": [...], "projectFiles": [...], "projectRoot": "..." }
//! stdout: { "dependencies": [...], "metadata": {...}, "errors": [...] }
//! ```
//!
//! Closing stdin signals end of input. A non-zero exit or malformed
//! output is logged and the built-in regex import scanner takes over for
//! that plugin's file group; analysis failures never abort the plan.
//!
//! ## Determinism
//!
//! Aggregated edges are deduplicated by `(from, to, type)` and sorted, so
//! the partition engine sees the same edge list on every run regardless of
//! plugin output order.

mod protocol;
mod manifest;
mod driver;
mod fallback;

pub use protocol::{AnalyzerInput, AnalyzerMetadata, AnalyzerOutput};
pub use manifest::PluginManifest;
pub use driver::{AnalysisReport, AnalyzerDriver, LoadedPlugin};
pub use fallback::scan_imports;
