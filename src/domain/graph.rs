//! Undirected relationship graph mirroring the hierarchy's edges.

use std::collections::{BTreeSet, HashMap};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use tracing::instrument;

/// Undirected graph keyed by user name.
///
/// Backed by a `StableGraph` so removing a node keeps every other index valid.
#[derive(Debug, Default)]
pub struct RelationshipGraph {
    graph: StableUnGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns false if the node already exists.
    #[instrument(level = "trace", skip(self))]
    pub fn add_node(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        true
    }

    /// Connect two existing nodes. Parallel edges are not created.
    #[instrument(level = "trace", skip(self))]
    pub fn add_edge(&mut self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => {
                self.graph.update_edge(ia, ib, ());
                true
            }
            _ => false,
        }
    }

    /// Remove a node together with all of its incident edges.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_node(&mut self, name: &str) -> bool {
        match self.index.remove(name) {
            Some(idx) => self.graph.remove_node(idx).is_some(),
            None => false,
        }
    }

    /// Relabel a node in place; its edges are untouched.
    #[instrument(level = "trace", skip(self))]
    pub fn rename_node(&mut self, old: &str, new: &str) -> bool {
        if self.contains(new) {
            return false;
        }
        let Some(idx) = self.index.remove(old) else {
            return false;
        };
        if let Some(weight) = self.graph.node_weight_mut(idx) {
            *weight = new.to_string();
        }
        self.index.insert(new.to_string(), idx);
        true
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Neighbor names, sorted.
    pub fn neighbors(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let neighbors: BTreeSet<&str> = self
            .graph
            .neighbors(idx)
            .filter_map(|n| self.graph.node_weight(n))
            .map(String::as_str)
            .collect();
        neighbors.into_iter().collect()
    }

    /// All node names, sorted.
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
            .map(String::as_str)
            .collect()
    }

    /// Frozen copy for read-only analytics.
    #[instrument(level = "debug", skip(self))]
    pub fn snapshot(&self) -> GraphSnapshot {
        let names: Vec<String> = self.nodes().into_iter().map(str::to_string).collect();
        let adjacency = names
            .iter()
            .map(|name| {
                self.neighbors(name)
                    .into_iter()
                    .filter_map(|n| names.binary_search_by(|name| name.as_str().cmp(n)).ok())
                    .collect()
            })
            .collect();
        GraphSnapshot { names, adjacency }
    }
}

/// Immutable adjacency view of a graph.
///
/// Nodes are numbered by their position in name order, so "lowest node id"
/// and "alphabetically first name" coincide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    names: Vec<String>,
    /// Sorted, without duplicates or self loops
    adjacency: Vec<Vec<usize>>,
}

impl GraphSnapshot {
    /// Build a snapshot directly from node names and undirected edges.
    ///
    /// Edge endpoints are added as nodes if missing.
    pub fn from_edges<N, S>(nodes: N, edges: &[(&str, &str)]) -> Self
    where
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = nodes.into_iter().map(Into::into).collect();
        for (a, b) in edges {
            set.insert(a.to_string());
            set.insert(b.to_string());
        }
        let names: Vec<String> = set.into_iter().collect();
        let position = |n: &str| names.binary_search_by(|name| name.as_str().cmp(n)).ok();

        let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); names.len()];
        for (a, b) in edges {
            if let (Some(ia), Some(ib)) = (position(*a), position(*b)) {
                if ia != ib {
                    adjacency[ia].insert(ib);
                    adjacency[ib].insert(ia);
                }
            }
        }

        Self {
            adjacency: adjacency.into_iter().map(|s| s.into_iter().collect()).collect(),
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, idx: usize) -> &str {
        &self.names[idx]
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.adjacency[idx]
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names
            .binary_search_by(|candidate| candidate.as_str().cmp(name))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_node_with_edges_when_removed_then_incident_edges_go_too() {
        let mut graph = RelationshipGraph::new();
        for n in ["ana", "bruno", "carla"] {
            graph.add_node(n);
        }
        graph.add_edge("ana", "bruno");
        graph.add_edge("bruno", "carla");

        assert!(graph.remove_node("bruno"));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(!graph.remove_node("bruno"));
    }

    #[test]
    fn given_duplicate_edge_when_added_then_graph_keeps_one() {
        let mut graph = RelationshipGraph::new();
        graph.add_node("ana");
        graph.add_node("bruno");

        graph.add_edge("ana", "bruno");
        graph.add_edge("bruno", "ana");

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("bruno", "ana"));
        assert!(!graph.add_edge("ana", "ghost"));
    }

    #[test]
    fn given_rename_then_edges_follow_the_new_name() {
        let mut graph = RelationshipGraph::new();
        graph.add_node("ana");
        graph.add_node("bruno");
        graph.add_edge("ana", "bruno");

        assert!(graph.rename_node("bruno", "bia"));

        assert!(graph.has_edge("ana", "bia"));
        assert_eq!(graph.neighbors("ana"), ["bia"]);
        assert!(!graph.contains("bruno"));
    }

    #[test]
    fn given_graph_when_snapshotted_then_nodes_are_sorted_and_linked() {
        let mut graph = RelationshipGraph::new();
        for n in ["zoe", "ana", "mia"] {
            graph.add_node(n);
        }
        graph.add_edge("zoe", "ana");

        let snapshot = graph.snapshot();

        assert_eq!(snapshot.names(), ["ana", "mia", "zoe"]);
        assert_eq!(snapshot.neighbors(0), [2]);
        assert!(snapshot.neighbors(1).is_empty());
        assert_eq!(snapshot, GraphSnapshot::from_edges(["mia"], &[("ana", "zoe")]));
    }
}
