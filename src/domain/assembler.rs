//! Partition assembly
//!
//! Builds the ordered partition list in three phases. Circular groups are
//! negotiated first (largest first; a group over the size bound needs the
//! user's approval) and are always emitted as exactly one partition.
//! Emission then walks dependency depth from the leaves up: at each depth
//! level the circular groups of that depth go out first, size-descending,
//! followed by the residual files of that depth in path-sorted chunks.
//! Files the partition budget cannot absorb fall through to a grouped
//! fallback that still respects depth order. Ids reflect emission order,
//! so every dependency edge lands in a partition with a strictly smaller
//! id than its dependents.
//!
//! The assembler performs no I/O. Oversize circular groups are negotiated
//! through the [`OversizeDecision`] callback, which the CLI implements as
//! an interactive prompt and tests implement as a script.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::change::{Dependency, FileChange};
use super::depth::dependency_depths;
use super::graph::DependencyGraph;
use super::grouper::group_files;
use super::namer::{partition_description, partition_name};
use super::partition::{Partition, Plan, PlanMetadata};
use super::scc::{circular_groups, find_components, Component};
use crate::config::SplitConfig;

#[derive(Debug, Error, PartialEq)]
pub enum AssemblyError {
    #[error("no changed files to partition")]
    NoChangedFiles,

    #[error("aborted: circular dependency group of {size} files exceeds the limit of {limit}")]
    UserAbort { size: usize, limit: usize },

    #[error("failed to allocate {} files to partitions", .files.len())]
    Unallocated { files: Vec<String> },
}

/// Decision point for circular groups larger than the partition size bound
///
/// Returning `true` accepts the oversize partition; `false` aborts the
/// whole plan. The engine yields here instead of prompting so it stays
/// free of I/O.
pub trait OversizeDecision {
    fn approve_oversize(&mut self, files: &[String], size: usize, limit: usize) -> bool;
}

/// Accepts every oversize group; used for unattended runs
pub struct ApproveAll;

impl OversizeDecision for ApproveAll {
    fn approve_oversize(&mut self, _files: &[String], _size: usize, _limit: usize) -> bool {
        true
    }
}

/// An assembled plan plus the warnings gathered along the way
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: Plan,
    pub warnings: Vec<String>,
}

/// Creates the partition plan for a change set
///
/// Pure and deterministic: identical `(changes, dependencies, config)`
/// inputs produce identical partitions.
pub fn create_plan(
    changes: &[FileChange],
    dependencies: &[Dependency],
    config: &SplitConfig,
    decision: &mut dyn OversizeDecision,
) -> Result<PlanOutcome, AssemblyError> {
    let mut changed: Vec<&FileChange> = changes.iter().filter(|c| c.is_changed).collect();
    changed.sort_by(|a, b| a.path.cmp(&b.path));

    if changed.is_empty() {
        return Err(AssemblyError::NoChangedFiles);
    }

    let mut warnings = Vec::new();
    let limit = config.max_files_per_partition;
    if changed.len() > config.capacity() {
        warnings.push(format!(
            "{} changed files exceed the configured capacity of {} ({} partitions x {} files); \
             the plan will exceed the partition budget",
            changed.len(),
            config.capacity(),
            config.max_partitions,
            limit,
        ));
    }

    let owned: Vec<FileChange> = changed.iter().map(|c| (*c).clone()).collect();
    let graph = DependencyGraph::build(&owned, dependencies);
    let components = find_components(&graph);
    let depths = dependency_depths(&graph, &components);

    // Negotiate every oversize circular group up front, largest first, so
    // an abort leaves nothing half-built behind.
    let circular = circular_groups(&components);
    for group in &circular {
        if group.len() > limit && !decision.approve_oversize(&group.files, group.len(), limit) {
            return Err(AssemblyError::UserAbort {
                size: group.len(),
                limit,
            });
        }
    }

    let file_map: BTreeMap<&str, &FileChange> =
        changed.iter().map(|c| (c.path.as_str(), *c)).collect();
    let mut builder = PlanBuilder::new(&graph, &file_map);

    // Circular groups keyed by depth, preserving the size-descending
    // order within each level.
    let mut circular_at: BTreeMap<usize, Vec<&Component>> = BTreeMap::new();
    for &group in &circular {
        let depth = depths.get(&group.files[0]).copied().unwrap_or(0);
        circular_at.entry(depth).or_default().push(group);
    }

    let in_cycle: BTreeSet<&str> = circular
        .iter()
        .flat_map(|g| g.files.iter().map(String::as_str))
        .collect();
    let mut residual_at: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for file in &changed {
        if in_cycle.contains(file.path.as_str()) {
            continue;
        }
        let depth = depths.get(&file.path).copied().unwrap_or(0);
        residual_at
            .entry(depth)
            .or_default()
            .push(file.path.as_str());
    }

    // Emit depth level by depth level, leaves first. A file always lands
    // strictly after everything it depends on; circular groups are never
    // split and never deferred, whatever the budget says.
    let mut levels: Vec<usize> = circular_at.keys().chain(residual_at.keys()).copied().collect();
    levels.sort_unstable();
    levels.dedup();

    let mut leftovers: BTreeMap<usize, Vec<&FileChange>> = BTreeMap::new();
    for depth in levels {
        for group in circular_at.get(&depth).into_iter().flatten() {
            let description = format!("Circular dependency group ({} files)", group.len());
            builder.emit(&group.files, Some(description), group.len() > limit);
        }

        for chunk in residual_at
            .get(&depth)
            .map(|paths| paths.chunks(limit))
            .into_iter()
            .flatten()
        {
            if builder.partitions.len() < config.max_partitions {
                let paths: Vec<String> = chunk.iter().map(|p| p.to_string()).collect();
                builder.emit(&paths, None, false);
            } else {
                leftovers
                    .entry(depth)
                    .or_default()
                    .extend(chunk.iter().map(|p| file_map[p]));
            }
        }
    }

    // Fallback: bucket the overflow by file kind. Depth levels stay
    // separate so the emission order still tracks the dependency order.
    if !leftovers.is_empty() {
        let overflow: usize = leftovers.values().map(Vec::len).sum();
        warnings.push(format!(
            "{} files beyond the partition budget were grouped by file kind into additional \
             partitions",
            overflow,
        ));

        for files in leftovers.values() {
            let residual: Vec<FileChange> = files.iter().map(|c| (*c).clone()).collect();
            for group in group_files(&residual).values() {
                let paths: Vec<String> = group.iter().map(|f| f.path.clone()).collect();
                for chunk in paths.chunks(limit) {
                    builder.emit(chunk, None, false);
                }
            }
        }
    }

    let missing: Vec<String> = changed
        .iter()
        .filter(|c| !builder.is_allocated(&c.path))
        .map(|c| c.path.clone())
        .collect();
    if !missing.is_empty() {
        return Err(AssemblyError::Unallocated { files: missing });
    }

    let partitions = builder.partitions;
    let metadata = PlanMetadata {
        total_files: changed.len(),
        total_partitions: partitions.len(),
        max_files_per_partition: limit,
        created_at: Utc::now(),
    };

    Ok(PlanOutcome {
        plan: Plan {
            partitions,
            metadata,
        },
        warnings,
    })
}

/// Accumulates partitions and tracks which files already belong somewhere
struct PlanBuilder<'a> {
    graph: &'a DependencyGraph,
    file_map: &'a BTreeMap<&'a str, &'a FileChange>,
    partitions: Vec<Partition>,
    owner: BTreeMap<String, usize>,
}

impl<'a> PlanBuilder<'a> {
    fn new(graph: &'a DependencyGraph, file_map: &'a BTreeMap<&'a str, &'a FileChange>) -> Self {
        Self {
            graph,
            file_map,
            partitions: Vec::new(),
            owner: BTreeMap::new(),
        }
    }

    fn is_allocated(&self, path: &str) -> bool {
        self.owner.contains_key(path)
    }

    /// Emits one partition from the given paths
    fn emit(&mut self, paths: &[String], description: Option<String>, oversize_approved: bool) {
        let id = self.partitions.len() + 1;

        let mut files: Vec<FileChange> = paths
            .iter()
            .filter_map(|p| self.file_map.get(p.as_str()).map(|c| (*c).clone()))
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let prerequisites = self.prerequisites_of(&files);
        let name = partition_name(&files);
        let description = description.unwrap_or_else(|| partition_description(&files));

        for file in &files {
            self.owner.insert(file.path.clone(), id);
        }

        self.partitions.push(Partition {
            id,
            name,
            description,
            files,
            prerequisites,
            oversize_approved,
        });
    }

    /// Earlier partitions that files in this set depend on
    fn prerequisites_of(&self, files: &[FileChange]) -> Vec<usize> {
        let mut ids: Vec<usize> = files
            .iter()
            .flat_map(|f| self.graph.successors(&f.path))
            .filter_map(|dep| self.owner.get(dep).copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::{ChangeType, DependencyStrength};

    fn changed(paths: &[&str]) -> Vec<FileChange> {
        paths
            .iter()
            .map(|p| FileChange::changed(*p, ChangeType::Modify))
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Dependency> {
        pairs
            .iter()
            .map(|(f, t)| Dependency::new(*f, *t, "import", DependencyStrength::Strong))
            .collect()
    }

    fn config(max_files: usize, max_partitions: usize) -> SplitConfig {
        SplitConfig {
            max_files_per_partition: max_files,
            max_partitions,
            ..SplitConfig::default()
        }
    }

    /// Scripted oversize decisions for tests
    struct Scripted(Vec<bool>);

    impl OversizeDecision for Scripted {
        fn approve_oversize(&mut self, _files: &[String], _size: usize, _limit: usize) -> bool {
            self.0.remove(0)
        }
    }

    fn plan_for(files: &[FileChange], deps: &[Dependency], cfg: &SplitConfig) -> PlanOutcome {
        create_plan(files, deps, cfg, &mut ApproveAll).unwrap()
    }

    #[test]
    fn empty_change_set_is_an_error() {
        let err = create_plan(&[], &[], &config(15, 8), &mut ApproveAll).unwrap_err();
        assert_eq!(err, AssemblyError::NoChangedFiles);

        let context_only = vec![FileChange::context("a.ts", "")];
        let err = create_plan(&context_only, &[], &config(15, 8), &mut ApproveAll).unwrap_err();
        assert_eq!(err, AssemblyError::NoChangedFiles);
    }

    #[test]
    fn chain_splits_into_ordered_singletons() {
        let files = changed(&["a", "b", "c"]);
        let deps = edges(&[("a", "b"), ("b", "c")]);

        let outcome = plan_for(&files, &deps, &config(1, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(parts[1].paths().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(parts[2].paths().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(parts[0].prerequisites, Vec::<usize>::new());
        assert_eq!(parts[1].prerequisites, vec![1]);
        assert_eq!(parts[2].prerequisites, vec![2]);
    }

    #[test]
    fn cycle_is_emitted_as_one_partition() {
        let files = changed(&["a", "b"]);
        let deps = edges(&[("a", "b"), ("b", "a")]);

        let outcome = plan_for(&files, &deps, &config(15, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(parts[0].description.starts_with("Circular dependency group"));
        assert!(!parts[0].oversize_approved);
    }

    #[test]
    fn diamond_stratifies_by_depth() {
        let files = changed(&["a", "b", "c", "d"]);
        let deps = edges(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);

        let outcome = plan_for(&files, &deps, &config(10, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["d"]);
        assert_eq!(parts[1].paths().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(parts[2].paths().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(parts[1].prerequisites, vec![1]);
        assert_eq!(parts[2].prerequisites, vec![2]);
    }

    #[test]
    fn oversize_cycle_needs_approval() {
        let files = changed(&["a", "b", "c"]);
        let deps = edges(&[("a", "b"), ("b", "c"), ("c", "a")]);

        let approved =
            create_plan(&files, &deps, &config(2, 8), &mut Scripted(vec![true])).unwrap();
        assert_eq!(approved.plan.partitions.len(), 1);
        assert_eq!(approved.plan.partitions[0].len(), 3);
        assert!(approved.plan.partitions[0].oversize_approved);

        let err =
            create_plan(&files, &deps, &config(2, 8), &mut Scripted(vec![false])).unwrap_err();
        assert_eq!(err, AssemblyError::UserAbort { size: 3, limit: 2 });
    }

    #[test]
    fn circular_groups_lead_their_depth_level_largest_first() {
        let files = changed(&["a", "b", "x", "y", "z", "solo"]);
        let deps = edges(&[
            ("a", "b"),
            ("b", "a"),
            ("x", "y"),
            ("y", "z"),
            ("z", "x"),
        ]);

        let outcome = plan_for(&files, &deps, &config(15, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["x", "y", "z"]);
        assert_eq!(parts[1].paths().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(parts[2].paths().any(|p| p == "solo"));
    }

    #[test]
    fn cycle_depending_on_a_leaf_comes_after_the_leaf() {
        let files = changed(&["a", "b", "leaf"]);
        let deps = edges(&[("a", "b"), ("b", "a"), ("a", "leaf")]);

        let outcome = plan_for(&files, &deps, &config(15, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["leaf"]);
        assert_eq!(parts[1].paths().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(parts[1].prerequisites, vec![1]);
    }

    #[test]
    fn oversized_depth_bucket_splits_in_path_order() {
        let files = changed(&["e", "d", "c", "b", "a"]);

        let outcome = plan_for(&files, &[], &config(2, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(parts[1].paths().collect::<Vec<_>>(), vec!["c", "d"]);
        assert_eq!(parts[2].paths().collect::<Vec<_>>(), vec!["e"]);
    }

    #[test]
    fn capacity_overflow_groups_residuals() {
        let paths: Vec<String> = (0..6).map(|i| format!("src/f{}.ts", i)).collect();
        let mut all: Vec<&str> = paths.iter().map(String::as_str).collect();
        all.push("zdocs/a.md");
        all.push("zdocs/b.md");
        let files = changed(&all);

        // Budget: 2 partitions x 3 files = 6; 8 changed files overflow.
        let outcome = plan_for(&files, &[], &config(3, 2));
        let plan = &outcome.plan;

        assert_eq!(plan.file_count(), 8);
        assert!(plan.partitions.len() > 2);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.warnings[0].contains("exceed the configured capacity"));
        assert!(outcome.warnings[1].contains("beyond the partition budget"));

        // Residual markdown files land together via the grouper.
        let last: Vec<Vec<&str>> = plan.partitions[2..]
            .iter()
            .map(|p| p.paths().collect())
            .collect();
        assert!(last
            .iter()
            .any(|paths| paths.contains(&"zdocs/a.md") && paths.contains(&"zdocs/b.md")));
    }

    #[test]
    fn prerequisites_point_at_every_dependency_partition() {
        let files = changed(&["app", "liba", "libb"]);
        let deps = edges(&[("app", "liba"), ("app", "libb")]);

        let outcome = plan_for(&files, &deps, &config(1, 8));
        let parts = &outcome.plan.partitions;

        assert_eq!(parts[0].paths().collect::<Vec<_>>(), vec!["liba"]);
        assert_eq!(parts[1].paths().collect::<Vec<_>>(), vec!["libb"]);
        assert_eq!(parts[2].paths().collect::<Vec<_>>(), vec!["app"]);
        assert_eq!(parts[2].prerequisites, vec![1, 2]);
    }

    #[test]
    fn plans_are_deterministic() {
        let files = changed(&["m/a.ts", "m/b.ts", "n/c.ts", "n/d.ts", "z.ts"]);
        let deps = edges(&[("m/a.ts", "n/c.ts"), ("n/d.ts", "z.ts")]);
        let cfg = config(2, 8);

        let first = plan_for(&files, &deps, &cfg);
        let second = plan_for(&files, &deps, &cfg);

        assert_eq!(first.plan.partitions, second.plan.partitions);
    }

    #[test]
    fn non_live_edges_do_not_change_the_plan() {
        let files = changed(&["a", "b"]);
        let cfg = config(15, 8);

        let bare = plan_for(&files, &[], &cfg);
        let with_noise = plan_for(
            &files,
            &edges(&[("a", "vendor/x.js"), ("outside", "b")]),
            &cfg,
        );

        assert_eq!(bare.plan.partitions, with_noise.plan.partitions);
    }
}
