use std::path::PathBuf;

use clap::Parser;
use dropship_deploy::{HARDHAT_NETWORK, OutputFormat};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "dropship")]
#[command(
    author,
    version,
    about = "Compile and deploy a smart contract to any configured network"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "DROPSHIP_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network to deploy to, as named in the network registry.
    #[arg(short, long, env = "DROPSHIP_NETWORK", default_value = HARDHAT_NETWORK)]
    pub network: String,

    /// Path to a configuration file.
    ///
    /// If not provided, `Dropship.toml` in the working directory is used when present.
    #[arg(short, long, alias = "conf", env = "DROPSHIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to a dotenv file to load secrets from.
    ///
    /// If not provided, `.env` in the working directory is loaded when present.
    /// Variables already set in the environment take precedence.
    #[arg(long, env = "DROPSHIP_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Resolve the network and build the deployment plan, then stop without deploying.
    #[arg(long, env = "DROPSHIP_DRY_RUN")]
    pub dry_run: bool,

    /// Print the known networks and exit.
    #[arg(long)]
    pub list_networks: bool,

    /// How the final result is printed.
    #[arg(long, env = "DROPSHIP_OUTPUT", default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Directory to write a record of the deployment to, as `<network>/<contract>.json`.
    #[arg(long, env = "DROPSHIP_RECORD_DIR")]
    pub record_dir: Option<PathBuf>,

    /// Give up waiting for confirmation after this many seconds.
    ///
    /// Overrides `confirmation_timeout_secs` from the configuration.
    /// If neither is set, the wait is unbounded.
    #[arg(long, env = "DROPSHIP_CONFIRMATION_TIMEOUT")]
    pub confirmation_timeout: Option<u64>,

    /// Skip the configured compile command and use the artifacts as they are.
    #[arg(long, env = "DROPSHIP_NO_COMPILE")]
    pub no_compile: bool,
}
