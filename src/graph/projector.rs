//! Cluster-filtered projection of a dependency graph.

use crate::models::{Graph, GraphLink, GraphNode, LinkEndpoint};
use std::collections::HashSet;

/// Compute the sub-graph to render for an optional cluster filter.
///
/// Without a filter the graph is returned as is. With one, only nodes whose
/// group equals the filter are kept, along with the links whose endpoints
/// both survive; those links come back with bare-id endpoints. The input is
/// never modified. A filter matching nothing yields an empty graph.
pub fn project(graph: &Graph, cluster: Option<&str>) -> Graph {
    let Some(cluster) = cluster else {
        return graph.clone();
    };

    let nodes: Vec<GraphNode> = graph
        .nodes
        .iter()
        .filter(|n| n.group.as_deref() == Some(cluster))
        .cloned()
        .collect();

    let in_scope: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    let links = graph
        .links
        .iter()
        .filter(|l| in_scope.contains(l.source.id()) && in_scope.contains(l.target.id()))
        .map(normalized)
        .collect();

    Graph { nodes, links }
}

fn normalized(link: &GraphLink) -> GraphLink {
    GraphLink {
        source: LinkEndpoint::Id(link.source.id().to_string()),
        target: LinkEndpoint::Id(link.target.id().to_string()),
    }
}
