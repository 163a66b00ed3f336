//! Louvain community detection
//!
//! Greedy modularity optimisation in two alternating phases:
//!
//! 1. **Local moving**: visit every node and move it to the neighboring
//!    community with the largest modularity gain, until a full pass moves
//!    nothing or gains less than [`MIN_IMPROVEMENT`].
//! 2. **Aggregation**: collapse each community into a super-node whose
//!    self-loop carries the community's internal weight.
//!
//! The phases repeat on the aggregated graph while modularity still improves.
//! Each round yields one level of the dendrogram; the partition handed out is
//! the last (coarsest) level mapped back onto the original nodes.

use crate::cluster::{Partition, Partitioner};
use crate::error::PartitionError;
use crate::graph::PeerGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};

/// Smallest modularity gain worth another pass or level
pub const MIN_IMPROVEMENT: f64 = 1e-7;

/// Louvain configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LouvainConfig {
    /// Resolution parameter (higher = more, smaller communities)
    pub resolution: f64,

    /// Shuffle the node visiting order with this seed; `None` visits nodes
    /// in identifier order
    pub seed: Option<u64>,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            seed: None,
        }
    }
}

/// Weighted graph of one aggregation level
struct LevelGraph {
    /// Neighbors with edge weight, self-loops excluded
    adjacency: Vec<Vec<(usize, f64)>>,

    /// Self-loop weight per node
    loops: Vec<f64>,
}

impl LevelGraph {
    fn from_peer_graph(graph: &PeerGraph) -> Self {
        let adjacency = (0..graph.node_count())
            .map(|node| {
                graph
                    .neighbors(node)
                    .map(|(neighbor, weight)| (neighbor as usize, weight as f64))
                    .collect()
            })
            .collect();

        Self {
            adjacency,
            loops: vec![0.0; graph.node_count()],
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Weighted degree, a self-loop counting twice
    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.loops[node]
    }

    fn total_weight(&self) -> f64 {
        let edges: f64 = self
            .adjacency
            .iter()
            .flat_map(|list| list.iter().map(|&(_, w)| w))
            .sum();
        edges / 2.0 + self.loops.iter().sum::<f64>()
    }

    /// Collapse communities into super-nodes
    fn aggregate(&self, communities: &[usize], community_count: usize) -> LevelGraph {
        let mut loops = vec![0.0; community_count];
        let mut weights: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); community_count];

        for (node, list) in self.adjacency.iter().enumerate() {
            let c1 = communities[node];
            loops[c1] += self.loops[node];

            // Each undirected edge once
            for &(neighbor, weight) in list.iter().filter(|&&(neighbor, _)| neighbor > node) {
                let c2 = communities[neighbor];
                if c1 == c2 {
                    loops[c1] += weight;
                } else {
                    *weights[c1].entry(c2).or_insert(0.0) += weight;
                    *weights[c2].entry(c1).or_insert(0.0) += weight;
                }
            }
        }

        LevelGraph {
            adjacency: weights.into_iter().map(|m| m.into_iter().collect()).collect(),
            loops,
        }
    }
}

/// Community bookkeeping while moving nodes of one level
struct Status {
    node_to_community: Vec<usize>,
    node_degrees: Vec<f64>,

    /// Summed degree of each community
    degrees: Vec<f64>,

    /// Weight inside each community, self-loops included
    internals: Vec<f64>,

    total_weight: f64,
}

impl Status {
    /// Every node starts in its own community
    fn new(graph: &LevelGraph) -> Self {
        let node_count = graph.node_count();
        let node_degrees: Vec<f64> = (0..node_count).map(|n| graph.degree(n)).collect();

        Self {
            node_to_community: (0..node_count).collect(),
            degrees: node_degrees.clone(),
            node_degrees,
            internals: graph.loops.clone(),
            total_weight: graph.total_weight(),
        }
    }

    fn modularity(&self, resolution: f64) -> f64 {
        let m = self.total_weight;
        self.internals
            .iter()
            .zip(&self.degrees)
            .filter(|&(_, &degree)| degree > 0.0)
            .map(|(&internal, &degree)| internal / m - resolution * (degree / (2.0 * m)).powi(2))
            .sum()
    }

    fn remove(&mut self, node: usize, community: usize, weight_to_community: f64, loop_weight: f64) {
        self.degrees[community] -= self.node_degrees[node];
        self.internals[community] -= weight_to_community + loop_weight;
        self.node_to_community[node] = usize::MAX;
    }

    fn insert(&mut self, node: usize, community: usize, weight_to_community: f64, loop_weight: f64) {
        self.node_to_community[node] = community;
        self.degrees[community] += self.node_degrees[node];
        self.internals[community] += weight_to_community + loop_weight;
    }

    /// Edge weight from `node` to each neighboring community
    fn neighbor_communities(&self, graph: &LevelGraph, node: usize) -> BTreeMap<usize, f64> {
        let mut weights = BTreeMap::new();
        for &(neighbor, weight) in &graph.adjacency[node] {
            *weights.entry(self.node_to_community[neighbor]).or_insert(0.0) += weight;
        }
        weights
    }
}

/// Louvain modularity optimisation
#[derive(Debug, Clone, Default)]
pub struct Louvain {
    config: LouvainConfig,
}

impl Louvain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LouvainConfig) -> Self {
        Self { config }
    }

    /// Partition at every level of the dendrogram, finest first.
    ///
    /// A graph without edges has a single level of singleton communities;
    /// an empty graph has one empty level.
    pub fn levels(&self, graph: &PeerGraph) -> Result<Vec<Partition>, PartitionError> {
        let resolution = self.config.resolution;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(PartitionError::InvalidResolution(resolution));
        }

        if graph.total_weight() == 0 {
            let singletons: Partition = graph
                .node_ids()
                .iter()
                .enumerate()
                .map(|(idx, id)| (id.clone(), idx as u32))
                .collect();
            return Ok(vec![singletons]);
        }

        let dendrogram = self.dendrogram(graph);

        // Map each level back onto the original nodes
        let mut current: Vec<usize> = (0..graph.node_count()).collect();
        let levels: Vec<Partition> = dendrogram
            .iter()
            .map(|level| {
                for community in current.iter_mut() {
                    *community = level[*community];
                }
                graph
                    .node_ids()
                    .iter()
                    .zip(&current)
                    .map(|(id, &community)| (id.clone(), community as u32))
                    .collect::<Partition>()
            })
            .collect();

        Ok(levels)
    }

    /// Node-to-community vectors of each level, each indexed by the nodes
    /// of the level below
    fn dendrogram(&self, graph: &PeerGraph) -> Vec<Vec<usize>> {
        let resolution = self.config.resolution;
        let mut rng = self.config.seed.map(StdRng::seed_from_u64);

        let mut level = LevelGraph::from_peer_graph(graph);
        let mut dendrogram = Vec::new();
        let mut modularity = f64::NEG_INFINITY;

        loop {
            let mut status = Status::new(&level);
            let order = visiting_order(level.node_count(), rng.as_mut());
            self.one_level(&level, &mut status, &order);

            let new_modularity = status.modularity(resolution);
            if !dendrogram.is_empty() && new_modularity - modularity < MIN_IMPROVEMENT {
                break;
            }

            let (communities, community_count) = renumber(&status.node_to_community);
            log::debug!(
                "Louvain level {}: {} communities, modularity {:.6}",
                dendrogram.len(),
                community_count,
                new_modularity
            );

            level = level.aggregate(&communities, community_count);
            dendrogram.push(communities);
            modularity = new_modularity;
        }

        dendrogram
    }

    /// Local moving phase on one level
    fn one_level(&self, graph: &LevelGraph, status: &mut Status, order: &[usize]) {
        let resolution = self.config.resolution;
        let mut modularity = status.modularity(resolution);

        loop {
            let mut moved = false;

            for &node in order {
                let community = status.node_to_community[node];
                let degree_share = status.node_degrees[node] / (2.0 * status.total_weight);
                let neighbor_weights = status.neighbor_communities(graph, node);
                let own_weight = neighbor_weights.get(&community).copied().unwrap_or(0.0);

                let remove_cost = -own_weight
                    + resolution * (status.degrees[community] - status.node_degrees[node]) * degree_share;
                status.remove(node, community, own_weight, graph.loops[node]);

                let mut best_community = community;
                let mut best_gain = 0.0;
                for (&candidate, &weight) in &neighbor_weights {
                    let gain = remove_cost + weight - resolution * status.degrees[candidate] * degree_share;
                    if gain > best_gain {
                        best_gain = gain;
                        best_community = candidate;
                    }
                }

                let best_weight = neighbor_weights.get(&best_community).copied().unwrap_or(0.0);
                status.insert(node, best_community, best_weight, graph.loops[node]);
                moved |= best_community != community;
            }

            let new_modularity = status.modularity(resolution);
            if !moved || new_modularity - modularity < MIN_IMPROVEMENT {
                break;
            }
            modularity = new_modularity;
        }
    }
}

impl Partitioner for Louvain {
    fn partition(&self, graph: &PeerGraph) -> Result<Partition, PartitionError> {
        log::info!(
            "Running Louvain on {} nodes (resolution {})",
            graph.node_count(),
            self.config.resolution
        );

        let partition = self.levels(graph)?.pop().unwrap_or_default();

        log::info!("Found {} communities", partition.community_ids().len());
        Ok(partition)
    }
}

fn visiting_order(node_count: usize, rng: Option<&mut StdRng>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..node_count).collect();
    if let Some(rng) = rng {
        order.shuffle(rng);
    }
    order
}

/// Renumber communities contiguously from 0 in node order
fn renumber(communities: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let renumbered = communities
        .iter()
        .map(|&c| {
            let next = mapping.len();
            *mapping.entry(c).or_insert(next)
        })
        .collect();

    (renumbered, mapping.len())
}
