//! End-to-end tests of fetch → build → partition → export with a stub source.

use peer_review_graph::cluster::{Louvain, Partition, Partitioner};
use peer_review_graph::config::Config;
use peer_review_graph::data::{DateRange, EvaluationQuery, Record, RecordSource};
use peer_review_graph::error::{FetchError, PartitionError, PipelineError};
use peer_review_graph::graph::PeerGraph;
use peer_review_graph::pipeline;
use peer_review_graph::storage::{cluster_file_name, GraphDocument, CLUSTER_INDEX_FILE, GRAPH_FILE};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

struct StaticSource(Vec<Record>);

impl RecordSource for StaticSource {
    fn fetch_records(&self, _query: &EvaluationQuery) -> Result<Vec<Record>, FetchError> {
        Ok(self.0.clone())
    }
}

struct FailingSource;

impl RecordSource for FailingSource {
    fn fetch_records(&self, _query: &EvaluationQuery) -> Result<Vec<Record>, FetchError> {
        Err(FetchError::Status {
            status: 502,
            url: "http://intra.test/v2/scale_teams".to_string(),
            body: "bad gateway".to_string(),
        })
    }
}

/// Puts every node in community 0 except the last one, which it forgets
struct ForgetfulPartitioner;

impl Partitioner for ForgetfulPartitioner {
    fn partition(&self, graph: &PeerGraph) -> Result<Partition, PartitionError> {
        let keep = graph.node_count().saturating_sub(1);
        Ok(graph.node_ids()[..keep].iter().map(|id| (id.clone(), 0)).collect())
    }
}

fn config(dir: &Path) -> Config {
    let range = DateRange::parse("2023-01-01", "2024-08-12").unwrap();
    Config::new(56, 21, range, dir)
}

fn read_document(path: &Path) -> GraphDocument {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn read_index(dir: &Path) -> Vec<u32> {
    serde_json::from_str(&fs::read_to_string(dir.join(CLUSTER_INDEX_FILE)).unwrap()).unwrap()
}

fn campus_records() -> Vec<Record> {
    vec![
        Record::new("alice", &["bob", "carol"]),
        Record::new("bob", &["carol", "alice"]),
        Record::new("carol", &["alice"]),
        Record::new("dave", &["erin", "frank"]),
        Record::new("erin", &["frank", "dave"]),
        Record::new("frank", &["dave"]),
        Record::new("carol", &["dave"]),
        Record::new("gina", &["gina"]),
        Record::new("hank", &[]),
    ]
}

#[test]
fn test_two_records_make_a_triangle() {
    let dir = tempfile::tempdir().unwrap();
    let source = StaticSource(vec![Record::new("a", &["b", "c"]), Record::new("b", &["c"])]);

    let summary = pipeline::run(&source, &Louvain::new(), &config(dir.path())).unwrap();
    assert_eq!(summary.record_count, 2);
    assert_eq!(summary.node_count, 3);
    assert_eq!(summary.edge_count, 3);

    let full = read_document(&dir.path().join(GRAPH_FILE));
    let ids: Vec<&str> = full.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    let weights: HashMap<(&str, &str), u32> = full
        .links
        .iter()
        .map(|l| ((l.source.as_str(), l.target.as_str()), l.value))
        .collect();
    let expected: HashMap<(&str, &str), u32> =
        [(("a", "b"), 1), (("a", "c"), 1), (("b", "c"), 1)].into_iter().collect();
    assert_eq!(weights, expected);
}

#[test]
fn test_cluster_files_partition_the_graph() {
    let dir = tempfile::tempdir().unwrap();
    let source = StaticSource(campus_records());

    let summary = pipeline::run(&source, &Louvain::new(), &config(dir.path())).unwrap();

    let full = read_document(&dir.path().join(GRAPH_FILE));
    let index = read_index(dir.path());
    assert_eq!(index.len(), summary.export.cluster_count);

    let all_nodes: BTreeSet<String> = full.nodes.iter().map(|n| n.id.clone()).collect();
    assert_eq!(all_nodes.len(), full.nodes.len());
    assert_eq!(all_nodes.len(), 8);

    // Each node lives in exactly one cluster file, tagged like in data.json
    let groups: HashMap<&str, u32> = full.nodes.iter().map(|n| (n.id.as_str(), n.group)).collect();
    let mut seen = BTreeSet::new();
    for &id in &index {
        let cluster = read_document(&dir.path().join(cluster_file_name(id)));
        assert!(!cluster.nodes.is_empty());
        for node in &cluster.nodes {
            assert_eq!(node.group, id);
            assert_eq!(groups[node.id.as_str()], id);
            assert!(seen.insert(node.id.clone()), "{} appears twice", node.id);
        }
        for link in &cluster.links {
            assert_eq!(groups[link.source.as_str()], id);
            assert_eq!(groups[link.target.as_str()], id);
        }
    }
    assert_eq!(seen, all_nodes);

    // The two triads end up apart, the lone nodes on their own
    assert_eq!(groups["alice"], groups["bob"]);
    assert_eq!(groups["dave"], groups["frank"]);
    assert_ne!(groups["alice"], groups["dave"]);
    assert_ne!(groups["gina"], groups["hank"]);
}

#[test]
fn test_self_pair_adds_no_loop() {
    let dir = tempfile::tempdir().unwrap();
    let source = StaticSource(vec![Record::new("solo", &["solo"])]);

    pipeline::run(&source, &Louvain::new(), &config(dir.path())).unwrap();

    let full = read_document(&dir.path().join(GRAPH_FILE));
    assert_eq!(full.nodes.len(), 1);
    assert_eq!(full.nodes[0].id, "solo");
    assert!(full.links.is_empty());
}

#[test]
fn test_empty_input_writes_empty_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let source = StaticSource(Vec::new());

    let summary = pipeline::run(&source, &Louvain::new(), &config(dir.path())).unwrap();

    assert_eq!(summary.node_count, 0);
    assert_eq!(read_index(dir.path()), Vec::<u32>::new());
    assert_eq!(read_document(&dir.path().join(GRAPH_FILE)), GraphDocument::default());
}

#[test]
fn test_round_trip_reconstructs_graph() {
    let dir = tempfile::tempdir().unwrap();
    let records = campus_records();
    let source = StaticSource(records.clone());

    pipeline::run(&source, &Louvain::new(), &config(dir.path())).unwrap();

    let parsed = read_document(&dir.path().join(GRAPH_FILE)).to_graph();
    let built = peer_review_graph::graph::build_graph(&records).unwrap();
    assert_eq!(parsed, built);
    assert_eq!(parsed.edge_weight_by_id("alice", "bob"), Some(2));
    assert_eq!(parsed.edge_weight_by_id("carol", "dave"), Some(1));
}

#[test]
fn test_fetch_error_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();

    let err = pipeline::run(&FailingSource, &Louvain::new(), &config(dir.path())).unwrap_err();

    assert!(matches!(err, PipelineError::Fetch(FetchError::Status { status: 502, .. })));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_malformed_record_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let mut records = campus_records();
    records[4].corrector = None;

    let err = pipeline::run(&StaticSource(records), &Louvain::new(), &config(dir.path())).unwrap_err();

    match err {
        PipelineError::MalformedRecord(e) => {
            assert_eq!(e.index, 4);
            assert_eq!(e.field, "corrector");
        }
        other => panic!("expected malformed record, got {other:?}"),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_incomplete_partition_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = StaticSource(campus_records());

    let err = pipeline::run(&source, &ForgetfulPartitioner, &config(dir.path())).unwrap_err();

    assert!(matches!(err, PipelineError::Partition(PartitionError::Uncovered(id)) if id == "hank"));
}

#[test]
fn test_missing_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("web");

    let err = pipeline::run(&StaticSource(campus_records()), &Louvain::new(), &config(&missing)).unwrap_err();

    assert!(matches!(err, PipelineError::Write(_)));
    assert!(!missing.exists());
}
