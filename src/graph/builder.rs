//! Graph construction module

use crate::data::Record;
use crate::error::MalformedRecordError;
use crate::graph::compressed::{Link, PeerGraph};
use crate::graph::edge_key;
use itertools::Itertools;
use std::collections::HashMap;

/// Builder for incrementally constructing a PeerGraph
#[derive(Debug, Default)]
pub struct GraphBuilder {
    /// Mapping from string IDs to insertion indices
    id_to_index: HashMap<String, u32>,

    /// Node string IDs in insertion order
    node_ids: Vec<String>,

    /// Accumulated weight per unordered node pair
    link_weights: HashMap<(u32, u32), u32>,

    /// Corrector/corrected pairs naming the same person
    self_pairs: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new graph builder with the given node capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id_to_index: HashMap::with_capacity(capacity),
            node_ids: Vec::with_capacity(capacity),
            link_weights: HashMap::with_capacity(capacity * 2),
            self_pairs: 0,
        }
    }

    /// Get or create a node index for the given string ID
    pub fn get_or_create_node(&mut self, id: &str) -> u32 {
        if let Some(&idx) = self.id_to_index.get(id) {
            return idx;
        }

        let idx = self.node_ids.len() as u32;
        self.id_to_index.insert(id.to_string(), idx);
        self.node_ids.push(id.to_string());

        idx
    }

    /// Add `weight` to the undirected edge between two nodes.
    ///
    /// Both nodes are created if needed. A self pair or a zero weight adds
    /// the nodes but no edge.
    pub fn add_link(&mut self, a: &str, b: &str, weight: u32) {
        let a_idx = self.get_or_create_node(a);
        let b_idx = self.get_or_create_node(b);

        if a_idx == b_idx {
            self.self_pairs += 1;
            return;
        }
        if weight == 0 {
            return;
        }

        *self.link_weights.entry(edge_key(a_idx, b_idx)).or_insert(0) += weight;
    }

    /// Count one corrector/corrected co-occurrence
    pub fn add_interaction(&mut self, corrector: &str, corrected: &str) {
        self.add_link(corrector, corrected, 1);
    }

    /// Add every interaction of a record.
    ///
    /// The record is validated before anything is added, so a malformed
    /// record leaves the builder untouched.
    pub fn add_record(&mut self, index: usize, record: &Record) -> Result<(), MalformedRecordError> {
        let corrector = record.corrector_login(index)?;
        let correcteds = record.corrected_logins(index)?;

        self.get_or_create_node(corrector);
        for corrected in correcteds {
            self.add_interaction(corrector, corrected);
        }

        Ok(())
    }

    /// Number of self pairs skipped so far
    pub fn self_pairs(&self) -> usize {
        self.self_pairs
    }

    /// Build the compressed graph, reindexing nodes in identifier order
    pub fn build(self) -> PeerGraph {
        let order: Vec<usize> = (0..self.node_ids.len())
            .sorted_unstable_by(|&a, &b| self.node_ids[a].cmp(&self.node_ids[b]))
            .collect();

        let mut old_to_new = vec![0u32; order.len()];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            old_to_new[old_idx] = new_idx as u32;
        }

        let links = self
            .link_weights
            .into_iter()
            .map(|((a, b), weight)| {
                let (source, target) = edge_key(old_to_new[a as usize], old_to_new[b as usize]);
                Link { source, target, weight }
            })
            .collect();

        let mut node_ids = self.node_ids;
        let node_ids = order
            .iter()
            .map(|&old_idx| std::mem::take(&mut node_ids[old_idx]))
            .collect();

        PeerGraph::from_parts(node_ids, links)
    }
}

/// Build the interaction graph for a full record sequence.
///
/// Any malformed record aborts the whole build.
pub fn build_graph(records: &[Record]) -> Result<PeerGraph, MalformedRecordError> {
    log::info!("Building interaction graph from {} records", records.len());

    let mut builder = GraphBuilder::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        builder.add_record(index, record)?;
    }

    if builder.self_pairs() > 0 {
        log::warn!("Skipped {} self-evaluation pairs", builder.self_pairs());
    }

    let graph = builder.build();
    log::info!(
        "Built graph with {} nodes and {} edges (total weight {})",
        graph.node_count(),
        graph.edge_count(),
        graph.total_weight()
    );

    Ok(graph)
}
