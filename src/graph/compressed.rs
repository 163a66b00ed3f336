//! Compressed weighted undirected graph

/// An undirected weighted edge between two node indices, `source < target`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    pub source: u32,
    pub target: u32,
    pub weight: u32,
}

/// Compressed sparse row representation of the interaction graph.
///
/// Node indices follow the lexicographic order of the node identifiers, so
/// iterating nodes or links by index is already the serialization order.
/// Every undirected edge is stored twice in the adjacency arrays (once per
/// endpoint) and once in `links`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerGraph {
    /// Sorted, unique node identifiers
    node_ids: Vec<String>,

    /// offsets[i] to offsets[i+1] is the adjacency range of node i
    offsets: Vec<u32>,

    /// Concatenated, per-node sorted neighbor lists
    neighbors: Vec<u32>,

    /// Weight of the edge at the same position in `neighbors`
    weights: Vec<u32>,

    /// Canonical edge list sorted by (source, target)
    links: Vec<Link>,
}

impl PeerGraph {
    /// Assemble a graph from sorted identifiers and canonical links.
    ///
    /// Callers guarantee `node_ids` is sorted and unique and that every link
    /// has `source < target`, a weight of at least one and no duplicate.
    pub(crate) fn from_parts(node_ids: Vec<String>, mut links: Vec<Link>) -> Self {
        let node_count = node_ids.len();
        links.sort_unstable();

        let mut adjacency_lists: Vec<Vec<(u32, u32)>> = vec![Vec::new(); node_count];
        for link in &links {
            adjacency_lists[link.source as usize].push((link.target, link.weight));
            adjacency_lists[link.target as usize].push((link.source, link.weight));
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0);
        let mut offset = 0;
        for list in &adjacency_lists {
            offset += list.len() as u32;
            offsets.push(offset);
        }

        let mut neighbors = Vec::with_capacity(offset as usize);
        let mut weights = Vec::with_capacity(offset as usize);
        for list in &mut adjacency_lists {
            // Sorted for binary search in edge_weight
            list.sort_unstable();
            for &(neighbor, weight) in list.iter() {
                neighbors.push(neighbor);
                weights.push(weight);
            }
        }

        Self {
            node_ids,
            offsets,
            neighbors,
            weights,
            links,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn node_ids(&self) -> &[String] {
        &self.node_ids
    }

    pub fn node_id(&self, node: u32) -> &str {
        &self.node_ids[node as usize]
    }

    /// Look up the index of a node identifier
    pub fn node_index(&self, id: &str) -> Option<u32> {
        self.node_ids
            .binary_search_by(|candidate| candidate.as_str().cmp(id))
            .ok()
            .map(|idx| idx as u32)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize..self.offsets[node + 1] as usize
    }

    /// Neighbors of a node with the weight of the connecting edge
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        let range = self.range(node);
        self.neighbors[range.clone()]
            .iter()
            .copied()
            .zip(self.weights[range].iter().copied())
    }

    /// Number of distinct neighbors
    pub fn neighbor_count(&self, node: usize) -> usize {
        self.range(node).len()
    }

    /// Weighted degree: sum of the weights of all incident edges
    pub fn degree(&self, node: usize) -> u64 {
        self.weights[self.range(node)].iter().map(|&w| w as u64).sum()
    }

    /// Sum of all edge weights, each undirected edge counted once
    pub fn total_weight(&self) -> u64 {
        self.links.iter().map(|link| link.weight as u64).sum()
    }

    /// Weight of the edge between two nodes, if they are connected
    pub fn edge_weight(&self, a: u32, b: u32) -> Option<u32> {
        let range = self.range(a as usize);
        let start = range.start;
        self.neighbors[range]
            .binary_search(&b)
            .ok()
            .map(|pos| self.weights[start + pos])
    }

    /// Weight of the edge between two node identifiers
    pub fn edge_weight_by_id(&self, a: &str, b: &str) -> Option<u32> {
        self.edge_weight(self.node_index(a)?, self.node_index(b)?)
    }

    /// Extract the subgraph induced by a set of node indices.
    ///
    /// Only edges with both endpoints among `members` are kept. Node
    /// identifiers are carried over, so the result is again sorted.
    pub fn induced_subgraph(&self, members: &[u32]) -> PeerGraph {
        let mut members = members.to_vec();
        members.sort_unstable();
        members.dedup();

        // Mapping from original to subgraph indices
        let mut orig_to_sub = vec![u32::MAX; self.node_count()];
        for (sub, &orig) in members.iter().enumerate() {
            orig_to_sub[orig as usize] = sub as u32;
        }

        let links = self
            .links
            .iter()
            .filter_map(|link| {
                let source = orig_to_sub[link.source as usize];
                let target = orig_to_sub[link.target as usize];
                (source != u32::MAX && target != u32::MAX).then_some(Link {
                    source,
                    target,
                    weight: link.weight,
                })
            })
            .collect();

        let node_ids = members
            .iter()
            .map(|&orig| self.node_ids[orig as usize].clone())
            .collect();

        PeerGraph::from_parts(node_ids, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_with_diagonal() -> PeerGraph {
        // a-b (2), b-c (1), c-d (3), a-d (1), a-c (4)
        let ids = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let links = vec![
            Link { source: 0, target: 1, weight: 2 },
            Link { source: 1, target: 2, weight: 1 },
            Link { source: 2, target: 3, weight: 3 },
            Link { source: 0, target: 3, weight: 1 },
            Link { source: 0, target: 2, weight: 4 },
        ];
        PeerGraph::from_parts(ids, links)
    }

    #[test]
    fn adjacency_is_symmetric_and_sorted() {
        let graph = square_with_diagonal();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 5);
        assert_eq!(graph.neighbors(0).collect::<Vec<_>>(), vec![(1, 2), (2, 4), (3, 1)]);
        assert_eq!(graph.neighbors(3).collect::<Vec<_>>(), vec![(0, 1), (2, 3)]);

        for link in graph.links() {
            assert_eq!(graph.edge_weight(link.source, link.target), Some(link.weight));
            assert_eq!(graph.edge_weight(link.target, link.source), Some(link.weight));
        }
        assert_eq!(graph.edge_weight(1, 3), None);
    }

    #[test]
    fn degrees_and_total_weight() {
        let graph = square_with_diagonal();

        assert_eq!(graph.degree(0), 7);
        assert_eq!(graph.degree(1), 3);
        assert_eq!(graph.neighbor_count(2), 3);
        assert_eq!(graph.total_weight(), 11);

        let degree_sum: u64 = (0..graph.node_count()).map(|n| graph.degree(n)).sum();
        assert_eq!(degree_sum, 2 * graph.total_weight());
    }

    #[test]
    fn lookup_by_identifier() {
        let graph = square_with_diagonal();

        assert_eq!(graph.node_index("c"), Some(2));
        assert_eq!(graph.node_index("z"), None);
        assert_eq!(graph.edge_weight_by_id("d", "c"), Some(3));
        assert_eq!(graph.edge_weight_by_id("a", "z"), None);
    }

    #[test]
    fn induced_subgraph_keeps_only_internal_edges() {
        let graph = square_with_diagonal();
        let sub = graph.induced_subgraph(&[3, 0, 2]);

        assert_eq!(sub.node_ids(), &["a", "c", "d"]);
        assert_eq!(sub.edge_count(), 3);
        assert_eq!(sub.edge_weight_by_id("a", "c"), Some(4));
        assert_eq!(sub.edge_weight_by_id("c", "d"), Some(3));
        assert_eq!(sub.edge_weight_by_id("a", "d"), Some(1));
    }

    #[test]
    fn isolated_nodes_have_empty_adjacency() {
        let ids = vec!["solo".to_string()];
        let graph = PeerGraph::from_parts(ids, Vec::new());

        assert_eq!(graph.neighbor_count(0), 0);
        assert_eq!(graph.degree(0), 0);
        assert_eq!(graph.total_weight(), 0);
        assert!(!graph.is_empty());
        assert!(PeerGraph::default().is_empty());
    }
}
