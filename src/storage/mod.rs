//! Results persistence module
//!
//! Writes the graph in the `{nodes, links}` shape the web view loads:
//! `data.json` for the full graph, one `data_cluster_<id>.json` per
//! community and `clusters.json` listing the community ids. Files are
//! overwritten one by one, so an interrupted export can leave files from an
//! older run next to fresh ones.

use crate::cluster::{build_clusters, Cluster, Partition};
use crate::error::{PartitionError, WriteError};
use crate::graph::{GraphBuilder, PeerGraph};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const GRAPH_FILE: &str = "data.json";
pub const CLUSTER_INDEX_FILE: &str = "clusters.json";

const INDENT: &[u8] = b"    ";

/// File name of a community's subgraph
pub fn cluster_file_name(id: u32) -> String {
    format!("data_cluster_{id}.json")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: String,
    pub group: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub source: String,
    pub target: String,
    pub value: u32,
}

/// A graph in the `{nodes, links}` shape, nodes sorted by id and links by
/// (source, target)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeEntry>,
    pub links: Vec<LinkEntry>,
}

impl GraphDocument {
    /// `groups` is indexed like the graph's nodes
    fn with_groups(graph: &PeerGraph, groups: &[u32]) -> Self {
        let nodes = graph
            .node_ids()
            .iter()
            .zip(groups)
            .map(|(id, &group)| NodeEntry {
                id: id.clone(),
                group,
            })
            .collect();

        let links = graph
            .links()
            .iter()
            .map(|link| LinkEntry {
                source: graph.node_id(link.source).to_string(),
                target: graph.node_id(link.target).to_string(),
                value: link.weight,
            })
            .collect();

        Self { nodes, links }
    }

    /// Tag every node of `graph` with its community
    pub fn from_graph(graph: &PeerGraph, partition: &Partition) -> Result<Self, PartitionError> {
        let groups = partition.groups_by_index(graph)?;
        Ok(Self::with_groups(graph, &groups))
    }

    /// Induced subgraph of one cluster
    fn for_cluster(graph: &PeerGraph, cluster: &Cluster) -> Self {
        let subgraph = graph.induced_subgraph(&cluster.members);
        Self::with_groups(&subgraph, &vec![cluster.id; subgraph.node_count()])
    }

    /// Rebuild the graph the document describes
    pub fn to_graph(&self) -> PeerGraph {
        let mut builder = GraphBuilder::with_capacity(self.nodes.len());
        for node in &self.nodes {
            builder.get_or_create_node(&node.id);
        }
        for link in &self.links {
            builder.add_link(&link.source, &link.target, link.value);
        }
        builder.build()
    }

    /// Community tags of the document's nodes
    pub fn to_partition(&self) -> Partition {
        self.nodes
            .iter()
            .map(|node| (node.id.clone(), node.group))
            .collect()
    }
}

/// What an export wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub cluster_count: usize,
    pub files_written: usize,
}

/// Save the graph, every cluster subgraph and the cluster index.
///
/// `output_dir` must already exist. The partition must cover exactly the
/// graph's nodes; nothing is written otherwise.
pub fn save_results(
    graph: &PeerGraph,
    partition: &Partition,
    output_dir: &Path,
) -> Result<ExportSummary, WriteError> {
    if !output_dir.is_dir() {
        return Err(WriteError::MissingOutputDir(output_dir.to_path_buf()));
    }

    let groups = partition.groups_by_index(graph)?;
    let clusters = build_clusters(graph, partition)?;

    log::info!("Saving {} clusters to {}", clusters.len(), output_dir.display());

    save_clusters(graph, &clusters, output_dir)?;

    let ids: Vec<u32> = clusters.iter().map(|cluster| cluster.id).collect();
    write_json(&output_dir.join(CLUSTER_INDEX_FILE), &ids)?;

    write_json(
        &output_dir.join(GRAPH_FILE),
        &GraphDocument::with_groups(graph, &groups),
    )?;

    log::info!("Results saved successfully");

    Ok(ExportSummary {
        output_dir: output_dir.to_path_buf(),
        cluster_count: clusters.len(),
        files_written: clusters.len() + 2,
    })
}

/// Save one subgraph file per cluster
fn save_clusters(graph: &PeerGraph, clusters: &[Cluster], output_dir: &Path) -> Result<(), WriteError> {
    log::info!("Saving individual cluster subgraphs");

    for cluster in clusters {
        log::debug!(
            "Cluster {}: {} members, internal weight {}, density {:.4}",
            cluster.id,
            cluster.size,
            cluster.internal_weight,
            cluster.density
        );

        let path = output_dir.join(cluster_file_name(cluster.id));
        write_json(&path, &GraphDocument::for_cluster(graph, cluster))?;
    }

    Ok(())
}

/// Write a value as JSON indented by four spaces
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
    value
        .serialize(&mut serializer)
        .map_err(|source| WriteError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    writer.flush().map_err(io_err)
}
