//! Strongly connected component discovery
//!
//! Wraps petgraph's Tarjan implementation (explicit work stack, so graph
//! size never threatens the thread stack) and normalises its output into a
//! deterministic order: members sorted by path, components sorted by their
//! smallest member.

use petgraph::algo::tarjan_scc;

use super::graph::DependencyGraph;

/// One strongly connected component of the dependency graph
///
/// A component of size 1 is an ordinary file. A component of size >= 2 is a
/// circular group and must be allocated to a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Member paths, sorted
    pub files: Vec<String>,
}

impl Component {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True when this component is a circular dependency group
    pub fn is_circular(&self) -> bool {
        self.files.len() >= 2
    }
}

/// Computes all strongly connected components of the graph
pub fn find_components(graph: &DependencyGraph) -> Vec<Component> {
    let inner = graph.petgraph();

    let mut components: Vec<Component> = tarjan_scc(inner)
        .into_iter()
        .map(|nodes| {
            let mut files: Vec<String> = nodes
                .into_iter()
                .filter_map(|idx| inner.node_weight(idx).cloned())
                .collect();
            files.sort_unstable();
            Component { files }
        })
        .collect();

    components.sort_by(|a, b| a.files[0].cmp(&b.files[0]));
    components
}

/// Returns the circular groups (size >= 2), largest first
///
/// Ties break on the smallest member path so the presentation order is
/// stable across runs.
pub fn circular_groups(components: &[Component]) -> Vec<&Component> {
    let mut groups: Vec<&Component> = components.iter().filter(|c| c.is_circular()).collect();
    groups.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.files[0].cmp(&b.files[0])));
    groups
}
