//! Graph analytics over a frozen `GraphSnapshot`.
//!
//! - Community detection (semi-synchronous label propagation over colour classes)
//! - Betweenness centrality (Brandes, sources processed in parallel)
//!
//! Both functions are pure: they never see the live registry.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::GraphSnapshot;

/// Default bound on label propagation passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Partition the nodes into communities by semi-synchronous label propagation.
///
/// Every node starts with its own label (its position in name order). The
/// graph is greedily coloured, and each pass updates one colour class at a
/// time; nodes of a class share no edge, so their updates are independent.
/// A node keeps its label while it is among the most frequent labels of its
/// neighbors, otherwise it takes the highest of them. Isolated nodes keep
/// their label. Stops once every node holds a most frequent label or after
/// `max_iterations` passes.
///
/// Communities are ordered by their alphabetically first member.
#[instrument(level = "debug", skip(graph), fields(nodes = graph.len()))]
pub fn detect_communities(graph: &GraphSnapshot, max_iterations: usize) -> Vec<BTreeSet<String>> {
    let mut labels: Vec<usize> = (0..graph.len()).collect();
    let classes = color_classes(graph);

    let mut passes = 0;
    while !labeling_complete(graph, &labels) {
        if passes == max_iterations {
            debug!("label propagation stopped after {} passes", passes);
            break;
        }
        for class in &classes {
            for &node in class {
                let top = most_frequent_labels(graph, &labels, node);
                if !top.contains(&labels[node]) {
                    if let Some(&highest) = top.iter().max() {
                        labels[node] = highest;
                    }
                }
            }
        }
        passes += 1;
    }
    debug!("label propagation finished after {} passes", passes);

    labels
        .iter()
        .enumerate()
        .map(|(node, &label)| (label, graph.name(node).to_string()))
        .into_group_map()
        .into_values()
        .map(|members| members.into_iter().collect::<BTreeSet<_>>())
        .sorted_by(|a, b| a.first().cmp(&b.first()))
        .collect()
}

/// Greedy colouring, largest degree first (ties in node order).
///
/// Returns the colour classes in colour order.
fn color_classes(graph: &GraphSnapshot) -> Vec<Vec<usize>> {
    let mut colors: Vec<Option<usize>> = vec![None; graph.len()];
    let mut classes: Vec<Vec<usize>> = Vec::new();

    for node in (0..graph.len()).sorted_by_key(|&v| Reverse(graph.neighbors(v).len())) {
        let used: HashSet<usize> = graph
            .neighbors(node)
            .iter()
            .filter_map(|&w| colors[w])
            .collect();
        let color = (0..=classes.len())
            .find(|c| !used.contains(c))
            .unwrap_or(classes.len());
        colors[node] = Some(color);
        if color == classes.len() {
            classes.push(Vec::new());
        }
        classes[color].push(node);
    }
    classes
}

/// Labels that occur most often among the neighbors; empty for isolated nodes.
fn most_frequent_labels(graph: &GraphSnapshot, labels: &[usize], node: usize) -> Vec<usize> {
    let counts = graph.neighbors(node).iter().map(|&w| labels[w]).counts();
    let max = counts.values().copied().max().unwrap_or(0);
    counts
        .into_iter()
        .filter(|&(_, count)| count == max)
        .map(|(label, _)| label)
        .collect()
}

fn labeling_complete(graph: &GraphSnapshot, labels: &[usize]) -> bool {
    (0..graph.len()).all(|node| {
        graph.neighbors(node).is_empty()
            || most_frequent_labels(graph, labels, node).contains(&labels[node])
    })
}

/// Normalized betweenness centrality for every node.
///
/// For each pair of other nodes, the fraction of shortest paths between them
/// that pass through the node, summed and divided by the number of such pairs
/// `(n-1)(n-2)/2`. Scores lie in `[0, 1]`; unreachable pairs contribute 0.
#[instrument(level = "debug", skip(graph), fields(nodes = graph.len()))]
pub fn centrality(graph: &GraphSnapshot) -> BTreeMap<String, f64> {
    let n = graph.len();

    let partial_scores: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|source| brandes_bfs_from_source(graph, source))
        .collect();

    let mut scores = vec![0.0; n];
    for partial in partial_scores {
        for (i, score) in partial.into_iter().enumerate() {
            scores[i] += score;
        }
    }

    // every unordered pair was counted from both ends
    let scale = if n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        0.0
    };

    scores
        .into_iter()
        .enumerate()
        .map(|(i, score)| (graph.name(i).to_string(), score * scale))
        .collect()
}

/// Dependency of `source` on every node (Brandes 2001, unweighted).
fn brandes_bfs_from_source(graph: &GraphSnapshot, source: usize) -> Vec<f64> {
    let n = graph.len();
    let mut stack = Vec::with_capacity(n);
    let mut paths = vec![0u64; n];
    let mut distance: Vec<Option<usize>> = vec![None; n];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut dependency = vec![0.0; n];

    paths[source] = 1;
    distance[source] = Some(0);
    let mut queue = VecDeque::from([source]);

    while let Some(v) = queue.pop_front() {
        stack.push(v);
        let next = distance[v].map(|d| d + 1);
        for &w in graph.neighbors(v) {
            if distance[w].is_none() {
                distance[w] = next;
                queue.push_back(w);
            }
            if distance[w] == next {
                paths[w] = paths[w].saturating_add(paths[v]);
                predecessors[w].push(v);
            }
        }
    }

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            dependency[v] += (paths[v] as f64 / paths[w] as f64) * (1.0 + dependency[w]);
        }
    }
    dependency[source] = 0.0;

    dependency
}
