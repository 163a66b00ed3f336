//! Cluster statistics and metrics

use crate::cluster::{Cluster, Partition};
use crate::error::PartitionError;
use crate::graph::PeerGraph;
use std::collections::HashMap;

/// Calculate the statistics of a cluster from its members
pub fn calculate_cluster_metrics(cluster: &mut Cluster, graph: &PeerGraph) {
    cluster.size = cluster.members.len();
    cluster.internal_weight = internal_weight(graph, &cluster.members);
    cluster.density = calculate_density(graph, &cluster.members);
}

fn membership(graph: &PeerGraph, members: &[u32]) -> Vec<bool> {
    let mut is_member = vec![false; graph.node_count()];
    for &node in members {
        is_member[node as usize] = true;
    }
    is_member
}

/// Summed weight of the edges with both endpoints in `members`
pub fn internal_weight(graph: &PeerGraph, members: &[u32]) -> u64 {
    let is_member = membership(graph, members);
    graph
        .links()
        .iter()
        .filter(|link| is_member[link.source as usize] && is_member[link.target as usize])
        .map(|link| link.weight as u64)
        .sum()
}

/// Calculate density (internal edges / potential edges)
pub fn calculate_density(graph: &PeerGraph, members: &[u32]) -> f32 {
    let n = members.len();
    if n <= 1 {
        return 1.0; // By convention, singleton clusters have density 1
    }

    // Potential edges = n * (n - 1) / 2 for an undirected graph
    let potential_edges = n * (n - 1) / 2;

    let is_member = membership(graph, members);
    let actual_edges = graph
        .links()
        .iter()
        .filter(|link| is_member[link.source as usize] && is_member[link.target as usize])
        .count();

    actual_edges as f32 / potential_edges as f32
}

/// Weighted modularity of a partition.
///
/// Q = sum over communities c of L_c / m - resolution * (D_c / 2m)^2, where
/// L_c is the weight inside c, D_c the summed degree of its members and m the
/// total edge weight. A graph without edges has modularity 0.
pub fn modularity(graph: &PeerGraph, partition: &Partition, resolution: f64) -> Result<f64, PartitionError> {
    let groups = partition.groups_by_index(graph)?;

    let total_weight = graph.total_weight() as f64;
    if total_weight == 0.0 {
        return Ok(0.0);
    }

    // (internal weight, summed degree) per community
    let mut totals: HashMap<u32, (f64, f64)> = HashMap::new();

    for link in graph.links() {
        let source = groups[link.source as usize];
        if source == groups[link.target as usize] {
            totals.entry(source).or_default().0 += link.weight as f64;
        }
    }
    for (node, &community) in groups.iter().enumerate() {
        totals.entry(community).or_default().1 += graph.degree(node) as f64;
    }

    let q = totals
        .values()
        .map(|&(l, d)| l / total_weight - resolution * (d / (2.0 * total_weight)).powi(2))
        .sum();

    Ok(q)
}
