use chrono::NaiveDate;
use clap::Parser;
use peer_review_graph::cluster::{Louvain, LouvainConfig};
use peer_review_graph::config::{
    ApiConfig, Config, DEFAULT_API_ROOT, DEFAULT_BEGIN, DEFAULT_CAMPUS_ID, DEFAULT_CURSUS_ID,
    DEFAULT_END, DEFAULT_OUTPUT_DIR,
};
use peer_review_graph::data::{DateRange, EvaluationQuery, IntraClient};
use peer_review_graph::{pipeline, Result};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "peer-review-graph",
    about = "Community analysis of 42 peer evaluations for the web graph view"
)]
struct Cli {
    /// Intra API root URL
    #[clap(long, env = "INTRA_API_ROOT", default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// Pre-issued bearer token (skips the client credentials exchange)
    #[clap(long, env = "INTRA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// OAuth application UID
    #[clap(long, env = "INTRA_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth application secret
    #[clap(long, env = "INTRA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Campus to pull evaluations from
    #[clap(long, env = "CAMPUS_ID", default_value_t = DEFAULT_CAMPUS_ID)]
    campus_id: u32,

    /// Cursus (cohort) to pull evaluations from
    #[clap(long, env = "CURSUS_ID", default_value_t = DEFAULT_CURSUS_ID)]
    cursus_id: u32,

    /// First evaluation date (YYYY-MM-DD, inclusive)
    #[clap(long, env = "BEGIN_AT", default_value_t = DEFAULT_BEGIN)]
    begin_at: NaiveDate,

    /// Last evaluation date (YYYY-MM-DD, inclusive)
    #[clap(long, env = "END_AT", default_value_t = DEFAULT_END)]
    end_at: NaiveDate,

    /// Existing directory for the JSON artifacts
    #[clap(long, env = "OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Louvain resolution (higher = smaller communities)
    #[clap(long, env = "LOUVAIN_RESOLUTION", default_value_t = 1.0)]
    resolution: f64,

    /// Seed for the Louvain visiting order
    #[clap(long, env = "LOUVAIN_SEED")]
    seed: Option<u64>,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        Ok(Config {
            api: ApiConfig {
                api_root: self.api_root,
                token: self.token,
                client_id: self.client_id,
                client_secret: self.client_secret,
                ..ApiConfig::default()
            },
            query: EvaluationQuery {
                campus_id: self.campus_id,
                cursus_id: self.cursus_id,
                range: DateRange::new(self.begin_at, self.end_at)?,
            },
            output_dir: self.output_dir,
            louvain: LouvainConfig {
                resolution: self.resolution,
                seed: self.seed,
            },
        })
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = args.into_config()?;

    log::info!("Starting peer review graph analysis");
    log::info!(
        "Campus {} / cursus {} / {}",
        config.query.campus_id,
        config.query.cursus_id,
        config.query.range
    );
    log::info!("Output: {}", config.output_dir.display());

    let client = IntraClient::new(config.api.clone())?;
    let louvain = Louvain::with_config(config.louvain.clone());

    let summary = pipeline::run(&client, &louvain, &config)?;

    log::info!(
        "Analysis complete. {} records, {} nodes, {} edges, {} clusters (modularity {:.4}). Results saved to {}",
        summary.record_count,
        summary.node_count,
        summary.edge_count,
        summary.export.cluster_count,
        summary.modularity,
        summary.export.output_dir.display()
    );

    Ok(())
}
