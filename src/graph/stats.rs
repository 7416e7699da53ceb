//! Graph statistics used in reports.

use crate::models::{AnalysisResult, Graph};
use std::collections::HashMap;

/// Size of one architecture cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSize {
    pub name: String,
    /// Members listed by the backend for the cluster.
    pub members: usize,
    /// Graph nodes whose group is the cluster.
    pub nodes: usize,
}

/// Sizes of all clusters, largest first, ties by name.
pub fn cluster_sizes(result: &AnalysisResult) -> Vec<ClusterSize> {
    let mut nodes_per_group: HashMap<&str, usize> = HashMap::new();
    for node in &result.graph.nodes {
        if let Some(group) = node.group.as_deref() {
            *nodes_per_group.entry(group).or_default() += 1;
        }
    }

    let mut sizes: Vec<ClusterSize> = result
        .clusters
        .iter()
        .map(|(name, members)| ClusterSize {
            name: name.clone(),
            members: members.len(),
            nodes: nodes_per_group.get(name.as_str()).copied().unwrap_or(0),
        })
        .collect();

    sizes.sort_by(|a, b| b.members.cmp(&a.members).then_with(|| a.name.cmp(&b.name)));
    sizes
}

/// The `n` nodes with the most links (in + out), highest first.
///
/// Dangling links do not count.
pub fn most_connected(graph: &Graph, n: usize) -> Vec<(String, usize)> {
    let ids = graph.node_ids();
    let mut degree: HashMap<&str, usize> = HashMap::new();

    for link in &graph.links {
        let (source, target) = (link.source.id(), link.target.id());
        if !ids.contains(source) || !ids.contains(target) {
            continue;
        }
        *degree.entry(source).or_default() += 1;
        *degree.entry(target).or_default() += 1;
    }

    let mut ranked: Vec<(String, usize)> = degree
        .into_iter()
        .map(|(id, count)| (id.to_string(), count))
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}
