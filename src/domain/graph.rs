//! Dependency graph over changed files
//!
//! Nodes are the paths of changed files; edges are the live dependency
//! edges between them. Uses petgraph for graph operations. Construction is
//! deterministic: nodes are inserted in sorted path order and successor
//! lists come back sorted, so every downstream traversal (SCC discovery,
//! depth assignment) is reproducible across runs.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};

use super::change::{Dependency, FileChange};

/// A directed graph of live dependencies between changed files
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph; node weights are file paths
    graph: DiGraph<String, ()>,

    /// Map from path to node index, ordered for deterministic iteration
    node_map: BTreeMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph from changed files and raw analyzer edges
    ///
    /// Edges with an endpoint outside the changed set are dropped (an
    /// analyzer may legitimately report edges to files not part of this
    /// change), as are self-loops. Parallel edges collapse to one.
    pub fn build(files: &[FileChange], dependencies: &[Dependency]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = BTreeMap::new();

        let mut paths: Vec<&str> = files
            .iter()
            .filter(|f| f.is_changed)
            .map(|f| f.path.as_str())
            .collect();
        paths.sort_unstable();
        paths.dedup();

        for path in &paths {
            let idx = graph.add_node(path.to_string());
            node_map.insert(path.to_string(), idx);
        }

        let mut edges: BTreeSet<(&str, &str)> = BTreeSet::new();
        for dep in dependencies {
            if dep.from == dep.to {
                continue;
            }
            if node_map.contains_key(&dep.from) && node_map.contains_key(&dep.to) {
                edges.insert((dep.from.as_str(), dep.to.as_str()));
            }
        }

        for (from, to) in edges {
            graph.add_edge(node_map[from], node_map[to], ());
        }

        Self { graph, node_map }
    }

    /// Returns all node paths in sorted order
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.node_map.keys().map(String::as_str)
    }

    /// Returns the sorted successors of a node (the files it depends on)
    pub fn successors(&self, path: &str) -> Vec<&str> {
        let idx = match self.node_map.get(path) {
            Some(idx) => *idx,
            None => return vec![],
        };

        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n).map(String::as_str))
            .collect();
        out.sort_unstable();
        out
    }

    /// Number of edges pointing at `path`
    pub fn in_degree(&self, path: &str) -> usize {
        self.node_map
            .get(path)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, petgraph::Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of edges leaving `path`
    pub fn out_degree(&self, path: &str) -> usize {
        self.node_map
            .get(path)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, petgraph::Direction::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns true if the graph contains the path
    pub fn contains(&self, path: &str) -> bool {
        self.node_map.contains_key(path)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Number of live edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub(crate) fn petgraph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::{ChangeType, DependencyStrength};

    fn changed(path: &str) -> FileChange {
        FileChange::changed(path, ChangeType::Modify)
    }

    fn edge(from: &str, to: &str) -> Dependency {
        Dependency::new(from, to, "import", DependencyStrength::Strong)
    }

    #[test]
    fn nodes_are_changed_files_only() {
        let files = vec![
            changed("b.ts"),
            changed("a.ts"),
            FileChange::context("ctx.ts", ""),
        ];
        let graph = DependencyGraph::build(&files, &[]);

        assert_eq!(graph.len(), 2);
        assert!(graph.contains("a.ts"));
        assert!(!graph.contains("ctx.ts"));

        let nodes: Vec<_> = graph.nodes().collect();
        assert_eq!(nodes, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn edges_to_unknown_files_are_dropped() {
        let files = vec![changed("a.ts"), changed("b.ts")];
        let deps = vec![
            edge("a.ts", "b.ts"),
            edge("a.ts", "node_modules/react.js"),
            edge("outside.ts", "b.ts"),
        ];
        let graph = DependencyGraph::build(&files, &deps);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.successors("a.ts"), vec!["b.ts"]);
    }

    #[test]
    fn self_loops_are_dropped() {
        let files = vec![changed("a.ts")];
        let graph = DependencyGraph::build(&files, &[edge("a.ts", "a.ts")]);

        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn parallel_edges_collapse() {
        let files = vec![changed("a.ts"), changed("b.ts")];
        let deps = vec![
            edge("a.ts", "b.ts"),
            Dependency::new("a.ts", "b.ts", "type-import", DependencyStrength::Moderate),
        ];
        let graph = DependencyGraph::build(&files, &deps);

        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn successors_are_sorted() {
        let files = vec![changed("a.ts"), changed("b.ts"), changed("c.ts")];
        let deps = vec![edge("a.ts", "c.ts"), edge("a.ts", "b.ts")];
        let graph = DependencyGraph::build(&files, &deps);

        assert_eq!(graph.successors("a.ts"), vec!["b.ts", "c.ts"]);
    }

    #[test]
    fn degrees() {
        let files = vec![changed("a.ts"), changed("b.ts"), changed("c.ts")];
        let deps = vec![edge("a.ts", "b.ts"), edge("c.ts", "b.ts")];
        let graph = DependencyGraph::build(&files, &deps);

        assert_eq!(graph.in_degree("b.ts"), 2);
        assert_eq!(graph.out_degree("b.ts"), 0);
        assert_eq!(graph.out_degree("a.ts"), 1);
        assert_eq!(graph.in_degree("missing.ts"), 0);
    }
}
