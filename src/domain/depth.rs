//! Dependency depth assignment
//!
//! `depth(v)` is the length in edges of the longest path from `v` in the
//! condensed DAG (circular groups collapsed to super-nodes). Files with no
//! outgoing dependencies sit at depth 0 and are partitioned first; a file
//! always lands at a strictly greater depth than everything it depends on,
//! which is what makes depth-ascending emission respect the edge order.

use std::collections::BTreeMap;

use super::graph::DependencyGraph;
use super::scc::Component;

/// Computes the dependency depth of every node in the graph
///
/// All members of a circular group share the depth of their super-node.
pub fn dependency_depths(
    graph: &DependencyGraph,
    components: &[Component],
) -> BTreeMap<String, usize> {
    let mut comp_of: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, component) in components.iter().enumerate() {
        for path in &component.files {
            comp_of.insert(path.as_str(), i);
        }
    }

    // Condensed adjacency; edges inside a component disappear.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); components.len()];
    for node in graph.nodes() {
        let from = comp_of[node];
        for succ in graph.successors(node) {
            let to = comp_of[succ];
            if from != to {
                adjacency[from].push(to);
            }
        }
    }
    for list in &mut adjacency {
        list.sort_unstable();
        list.dedup();
    }

    let mut memo: Vec<Option<usize>> = vec![None; components.len()];
    for start in 0..components.len() {
        if memo[start].is_none() {
            resolve_depth(start, &adjacency, &mut memo);
        }
    }

    let mut depths = BTreeMap::new();
    for (i, component) in components.iter().enumerate() {
        let depth = memo[i].unwrap_or(0);
        for path in &component.files {
            depths.insert(path.clone(), depth);
        }
    }
    depths
}

/// Memoized depth of one condensed node, with an explicit stack
///
/// A successor still on the stack contributes 0; the condensation is
/// acyclic so this guard only matters if the input invariant is broken.
fn resolve_depth(start: usize, adjacency: &[Vec<usize>], memo: &mut [Option<usize>]) {
    let mut on_stack = vec![false; adjacency.len()];
    let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
    on_stack[start] = true;

    while let Some((node, cursor)) = stack.last().copied() {
        let succs = &adjacency[node];
        if cursor < succs.len() {
            if let Some(frame) = stack.last_mut() {
                frame.1 += 1;
            }
            let next = succs[cursor];
            if memo[next].is_none() && !on_stack[next] {
                on_stack[next] = true;
                stack.push((next, 0));
            }
        } else {
            let depth = succs
                .iter()
                .map(|&s| memo[s].map(|d| d + 1).unwrap_or(0))
                .max()
                .unwrap_or(0);
            memo[node] = Some(depth);
            on_stack[node] = false;
            stack.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::{ChangeType, Dependency, DependencyStrength, FileChange};
    use crate::domain::scc::find_components;

    fn depths_for(paths: &[&str], edges: &[(&str, &str)]) -> BTreeMap<String, usize> {
        let files: Vec<FileChange> = paths
            .iter()
            .map(|p| FileChange::changed(*p, ChangeType::Modify))
            .collect();
        let deps: Vec<Dependency> = edges
            .iter()
            .map(|(f, t)| Dependency::new(*f, *t, "import", DependencyStrength::Strong))
            .collect();
        let graph = DependencyGraph::build(&files, &deps);
        let components = find_components(&graph);
        dependency_depths(&graph, &components)
    }

    #[test]
    fn isolated_files_have_depth_zero() {
        let depths = depths_for(&["a", "b"], &[]);
        assert_eq!(depths["a"], 0);
        assert_eq!(depths["b"], 0);
    }

    #[test]
    fn chain_depths_increase_toward_the_dependent() {
        let depths = depths_for(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        assert_eq!(depths["c"], 0);
        assert_eq!(depths["b"], 1);
        assert_eq!(depths["a"], 2);
    }

    #[test]
    fn diamond_takes_the_longest_path() {
        let depths = depths_for(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        assert_eq!(depths["d"], 0);
        assert_eq!(depths["b"], 1);
        assert_eq!(depths["c"], 1);
        assert_eq!(depths["a"], 2);
    }

    #[test]
    fn cycle_members_share_one_depth() {
        let depths = depths_for(
            &["a", "b", "leaf"],
            &[("a", "b"), ("b", "a"), ("a", "leaf")],
        );
        assert_eq!(depths["leaf"], 0);
        assert_eq!(depths["a"], 1);
        assert_eq!(depths["b"], 1);
    }

    #[test]
    fn pure_cycle_sits_at_depth_zero() {
        let depths = depths_for(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(depths["a"], 0);
        assert_eq!(depths["b"], 0);
        assert_eq!(depths["c"], 0);
    }

    #[test]
    fn deep_chain_does_not_overflow() {
        let paths: Vec<String> = (0..4000).map(|i| format!("f{:05}", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let edges: Vec<(&str, &str)> = refs.windows(2).map(|w| (w[0], w[1])).collect();

        let depths = depths_for(&refs, &edges);
        assert_eq!(depths[refs[refs.len() - 1]], 0);
        assert_eq!(depths[refs[0]], 3999);
    }
}
