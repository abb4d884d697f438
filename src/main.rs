use anyhow::Result;
use clap::{Parser, Subcommand};
use proxy_sync::{
    config::{Config, DEFAULT_INPUT_FILE, DEFAULT_OWNER, DEFAULT_RAW_FILE, DEFAULT_REPO},
    proxy::CheckerConfig,
    Pipeline,
};
use std::path::PathBuf;
use std::time::Duration;

/// Merge, validate and publish proxy lists to a remote repository
#[derive(Parser)]
#[command(name = "proxy-sync")]
#[command(about = "Merge, validate and publish proxy lists to a remote repository")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Owner of the data-store repository
    #[arg(long, default_value = DEFAULT_OWNER)]
    owner: String,

    /// Name of the data-store repository
    #[arg(long, default_value = DEFAULT_REPO)]
    repo: String,

    /// Local file with the scraped proxy batch (JSON lines)
    #[arg(short, long, default_value = DEFAULT_INPUT_FILE)]
    input: PathBuf,

    /// Local raw candidate file
    #[arg(long, default_value = DEFAULT_RAW_FILE)]
    raw_file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the scraped batch into the published set and publish artifacts
    Sync {
        /// Probe every merged proxy and publish only the live ones
        #[arg(long)]
        validate: bool,
        /// Number of concurrent liveness probes
        #[arg(short = 'n', long, default_value = "50")]
        concurrency: usize,
        /// Per-probe timeout in seconds
        #[arg(long, default_value = "5")]
        timeout: u64,
        /// Maximum acceptable probe round trip in seconds
        #[arg(long, default_value = "3.0")]
        max_response: f64,
        /// Echo endpoint requested through each candidate
        #[arg(long, default_value = "http://httpbin.org/get")]
        test_url: String,
    },
    /// Upload the raw scraper files verbatim, then clean up
    Raw,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(format!("proxy_sync={level}"))
        .init();

    let token = Config::token_from_env()?;
    let mut config = Config::new(token);
    config.owner = cli.owner;
    config.repo = cli.repo;
    config.input_file = cli.input;
    config.raw_file = cli.raw_file;

    match cli.command {
        Commands::Sync {
            validate,
            concurrency,
            timeout,
            max_response,
            test_url,
        } => {
            config.validate = validate;
            config.checker = CheckerConfig::new()
                .with_concurrency(concurrency)
                .with_timeout(Duration::from_secs(timeout))
                .with_max_response_secs(max_response)
                .with_test_url(test_url);

            Pipeline::new(config)?.sync().await
        }
        Commands::Raw => Pipeline::new(config)?.passthrough().await,
    }
}
