//! Error types for each pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while pulling records from the intra API
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport-level failure (connection, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API returned {status} for {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// A page body could not be decoded as a list of records
    #[error("malformed response on page {page}: {source}")]
    MalformedPage {
        page: u32,
        #[source]
        source: serde_json::Error,
    },

    /// The token endpoint answered with something that is not a token
    #[error("malformed token response: {0}")]
    MalformedToken(#[source] serde_json::Error),

    /// Neither a token nor client credentials were configured
    #[error("no API credentials configured (set INTRA_TOKEN or INTRA_CLIENT_ID/INTRA_CLIENT_SECRET)")]
    MissingCredentials,

    /// The API kept answering 429 after all retries
    #[error("rate limited on page {page} after {retries} retries")]
    RateLimited { page: u32, retries: u32 },

    /// The requested date range is empty or unparsable
    #[error("invalid date range: {0}")]
    InvalidRange(String),
}

/// A record is missing an identity field the graph needs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record #{index}{} is missing `{field}`", .id.map(|id| format!(" (id {id})")).unwrap_or_default())]
pub struct MalformedRecordError {
    /// Position of the record in the fetched sequence
    pub index: usize,

    /// API identifier of the record, when it had one
    pub id: Option<u64>,

    /// Path of the missing field, e.g. `correcteds[1].login`
    pub field: String,
}

/// Errors raised by a partitioner or while checking its output
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PartitionError {
    #[error("resolution must be a positive finite number, got {0}")]
    InvalidResolution(f64),

    #[error("node `{0}` has no community")]
    Uncovered(String),

    #[error("partition assigns unknown node `{0}`")]
    UnknownNode(String),
}

/// Errors raised while writing artifacts
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("output directory {0} does not exist")]
    MissingOutputDir(PathBuf),

    /// The partition does not match the graph being exported
    #[error("cannot export partition: {0}")]
    Partition(#[from] PartitionError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Any failure that aborts a run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    MalformedRecord(#[from] MalformedRecordError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Write(#[from] WriteError),
}
