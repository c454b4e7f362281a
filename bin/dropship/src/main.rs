//! dropship is a CLI tool to deploy a smart contract to any configured network in one command.

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use dropship_deploy::{
    DeployError, DeploymentRecord, DeploymentResult, DropshipConfig, EvmContractFactory,
    Orchestrator, ProcessEnv, build_plan, render, render_networks, render_plan, resolve,
    template_secrets,
};

/// How an invocation ended.
enum Completion {
    /// A deployment ran (or failed before it could).
    Deployment(DeploymentResult),
    /// Informational output only: a network listing or a dry-run plan.
    Listing(String),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env_file = load_env_file(cli.env_file.as_deref());
    // Parse again so `DROPSHIP_*` variables set in the dotenv file reach the flags too.
    let cli = Cli::parse();

    // Initialize the logger. Logs go to stderr so stdout only carries the result.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let completion = match env_file {
        Ok(loaded) => {
            if let Some(path) = loaded {
                tracing::debug!(path = %path.display(), "Loaded environment file");
            }
            run(&cli).await
        }
        Err(e) => Err(e),
    }
    .unwrap_or_else(|e| Completion::Deployment(DeploymentResult::from(e)));

    match completion {
        Completion::Listing(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        Completion::Deployment(result) => {
            let report = render(&result, cli.output);
            if report.outcome.is_success() {
                println!("{}", report.line);
            } else {
                eprintln!("{}", report.line);
            }
            ExitCode::from(report.outcome.exit_code())
        }
    }
}

async fn run(cli: &Cli) -> Result<Completion, DeployError> {
    let mut config = DropshipConfig::load(cli.config.as_deref())?;
    apply_overrides(cli, &mut config);

    let registry = config.registry()?;
    if cli.list_networks {
        return Ok(Completion::Listing(render_networks(&registry)));
    }

    let template = &config.contract.constructor_args;
    let (network, secrets) = resolve(
        &registry,
        &cli.network,
        &template_secrets(template),
        &ProcessEnv,
    )?;
    let plan = build_plan(&config.contract.name, &network.profile, &secrets, template)?;

    if cli.dry_run {
        tracing::info!(network = %cli.network, "Dry run, nothing will be deployed");
        return Ok(Completion::Listing(render_plan(&plan)));
    }

    let factory = EvmContractFactory::connect(&network, &secrets, config.factory_options())?;
    let result = Orchestrator::new(factory)
        .confirmation_timeout(config.confirmation_timeout())
        .run(&plan)
        .await;

    if let (
        Some(dir),
        DeploymentResult::Success {
            contract_address,
            transaction_hash,
        },
    ) = (&cli.record_dir, &result)
    {
        let record =
            DeploymentRecord::new(&plan, contract_address.clone(), transaction_hash.clone());
        if let Err(e) = record.save(dir) {
            tracing::warn!(error = %format!("{e:#}"), "Failed to save deployment record");
        }
    }

    Ok(Completion::Deployment(result))
}

/// Apply the flags that take precedence over the configuration.
fn apply_overrides(cli: &Cli, config: &mut DropshipConfig) {
    if cli.no_compile {
        config.compile_command = None;
    }
    if let Some(secs) = cli.confirmation_timeout {
        config.confirmation_timeout_secs = Some(secs);
    }
}

/// Load secrets from a dotenv file, returning the file that was loaded.
///
/// An explicitly requested file must load. Without one, `.env` is looked up from the
/// working directory and its absence is not an error. Variables already set are left
/// untouched.
fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, DeployError> {
    match path {
        Some(path) => dotenvy::from_path(path)
            .map(|()| Some(path.to_path_buf()))
            .map_err(|e| {
                DeployError::Configuration(format!("failed to load {}: {}", path.display(), e))
            }),
        None => match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(DeployError::Configuration(format!(
                "failed to load .env: {e}"
            ))),
        },
    }
}
