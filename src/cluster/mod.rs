//! Community detection module

pub mod louvain;
pub mod metrics;

pub use louvain::{Louvain, LouvainConfig};

use crate::error::PartitionError;
use crate::graph::PeerGraph;
use itertools::Itertools;
use std::collections::BTreeMap;

/// Assignment of every node identifier to a community id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    assignments: BTreeMap<String, u32>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a node into a community, returning its previous community
    pub fn assign(&mut self, id: impl Into<String>, community: u32) -> Option<u32> {
        self.assignments.insert(id.into(), community)
    }

    pub fn group_of(&self, id: &str) -> Option<u32> {
        self.assignments.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Assignments in identifier order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.assignments.iter().map(|(id, &community)| (id.as_str(), community))
    }

    /// Distinct community ids, ascending
    pub fn community_ids(&self) -> Vec<u32> {
        self.assignments.values().copied().sorted_unstable().dedup().collect()
    }

    /// Members of each community, sorted by identifier
    pub fn communities(&self) -> BTreeMap<u32, Vec<String>> {
        let mut communities: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for (id, &community) in &self.assignments {
            communities.entry(community).or_default().push(id.clone());
        }
        communities
    }

    /// Check the partition covers exactly the nodes of `graph`
    pub fn validate(&self, graph: &PeerGraph) -> Result<(), PartitionError> {
        self.groups_by_index(graph).map(|_| ())
    }

    /// Community of every node, indexed like the graph's nodes
    pub fn groups_by_index(&self, graph: &PeerGraph) -> Result<Vec<u32>, PartitionError> {
        if let Some(unknown) = self.assignments.keys().find(|id| graph.node_index(id).is_none()) {
            return Err(PartitionError::UnknownNode(unknown.clone()));
        }

        graph
            .node_ids()
            .iter()
            .map(|id| self.group_of(id).ok_or_else(|| PartitionError::Uncovered(id.clone())))
            .collect()
    }
}

impl FromIterator<(String, u32)> for Partition {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            assignments: iter.into_iter().collect(),
        }
    }
}

/// Anything that splits a graph into communities
pub trait Partitioner {
    fn partition(&self, graph: &PeerGraph) -> Result<Partition, PartitionError>;
}

/// Represents one community of the partitioned graph
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Community id from the partition
    pub id: u32,

    /// Members of this cluster (node indices, ascending)
    pub members: Vec<u32>,

    /// Size of the cluster
    pub size: usize,

    /// Summed weight of the edges inside the cluster
    pub internal_weight: u64,

    /// Density: internal edges / potential edges
    pub density: f32,
}

/// Group the graph's nodes into clusters, ordered by community id
pub fn build_clusters(graph: &PeerGraph, partition: &Partition) -> Result<Vec<Cluster>, PartitionError> {
    let groups = partition.groups_by_index(graph)?;

    let mut members_by_id: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for (node, &community) in groups.iter().enumerate() {
        members_by_id.entry(community).or_default().push(node as u32);
    }

    let clusters = members_by_id
        .into_iter()
        .map(|(id, members)| {
            let mut cluster = Cluster {
                id,
                size: members.len(),
                members,
                internal_weight: 0,
                density: 0.0,
            };
            metrics::calculate_cluster_metrics(&mut cluster, graph);
            cluster
        })
        .collect();

    Ok(clusters)
}
