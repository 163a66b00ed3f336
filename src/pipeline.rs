//! Fetch → build → partition → export

use crate::cluster::{metrics, Partitioner};
use crate::config::Config;
use crate::data::RecordSource;
use crate::error::PipelineError;
use crate::graph::build_graph;
use crate::storage::{self, ExportSummary};

/// Outcome of a complete run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub record_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    pub modularity: f64,
    pub export: ExportSummary,
}

/// Run the whole pipeline once. Any stage failure aborts the run.
///
/// The configured resolution is only used to report modularity; the
/// partitioner brings its own settings.
pub fn run(
    source: &dyn RecordSource,
    partitioner: &dyn Partitioner,
    config: &Config,
) -> Result<RunSummary, PipelineError> {
    // 1. Fetch records
    let records = source.fetch_records(&config.query)?;

    // 2. Build the interaction graph
    let graph = build_graph(&records)?;

    // 3. Find communities
    let partition = partitioner.partition(&graph)?;
    partition.validate(&graph)?;

    let modularity = metrics::modularity(&graph, &partition, config.louvain.resolution)?;
    log::info!(
        "Partitioned {} nodes into {} communities (modularity {:.4})",
        partition.len(),
        partition.community_ids().len(),
        modularity
    );

    // 4. Save results
    let export = storage::save_results(&graph, &partition, &config.output_dir)?;

    Ok(RunSummary {
        record_count: records.len(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        modularity,
        export,
    })
}
