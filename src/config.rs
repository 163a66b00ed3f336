//! Configuration management for the peer review graph

use crate::cluster::louvain::LouvainConfig;
use crate::data::{DateRange, EvaluationQuery};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_ROOT: &str = "https://api.intra.42.fr";
pub const DEFAULT_CAMPUS_ID: u32 = 56;
pub const DEFAULT_CURSUS_ID: u32 = 21;
pub const DEFAULT_OUTPUT_DIR: &str = "web";

pub const DEFAULT_BEGIN: NaiveDate = match NaiveDate::from_ymd_opt(2023, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default begin date"),
};

pub const DEFAULT_END: NaiveDate = match NaiveDate::from_ymd_opt(2024, 8, 12) {
    Some(date) => date,
    None => panic!("invalid default end date"),
};

/// Connection settings for the intra API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme and host, without a trailing path
    pub api_root: String,

    /// Pre-issued bearer token; skips the client credentials exchange
    pub token: Option<String>,

    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    /// Records requested per page; the client clamps it to `1..=100`
    pub page_size: u32,

    pub timeout: Duration,

    /// How many 429 answers to sit out per page before giving up
    pub max_retries: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            token: None,
            client_id: None,
            client_secret: None,
            page_size: 100,
            timeout: Duration::from_secs(30),
            max_retries: 5,
        }
    }
}

/// Full configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    /// Campus, cursus and date range to pull
    pub query: EvaluationQuery,

    /// Existing directory the JSON artifacts are written to
    pub output_dir: PathBuf,

    pub louvain: LouvainConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            query: EvaluationQuery {
                campus_id: DEFAULT_CAMPUS_ID,
                cursus_id: DEFAULT_CURSUS_ID,
                range: DateRange::from_ordered(DEFAULT_BEGIN, DEFAULT_END),
            },
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            louvain: LouvainConfig::default(),
        }
    }
}

impl Config {
    /// Create a configuration for a specific campus, cursus and range
    pub fn new(campus_id: u32, cursus_id: u32, range: DateRange, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            query: EvaluationQuery {
                campus_id,
                cursus_id,
                range,
            },
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_dataset() {
        let config = Config::default();
        assert_eq!(config.query.campus_id, 56);
        assert_eq!(config.query.cursus_id, 21);
        assert_eq!(config.query.range.to_string(), "2023-01-01,2024-08-12");
        assert_eq!(config.output_dir, PathBuf::from("web"));
        assert_eq!(config.api.page_size, 100);
    }

    #[test]
    fn new_overrides_query_and_output() {
        let range = DateRange::parse("2024-01-01", "2024-06-30").unwrap();
        let config = Config::new(1, 9, range, "/tmp/out");
        assert_eq!(config.query.campus_id, 1);
        assert_eq!(config.query.cursus_id, 9);
        assert_eq!(config.query.range, range);
        assert_eq!(config.api.api_root, DEFAULT_API_ROOT);
    }
}
