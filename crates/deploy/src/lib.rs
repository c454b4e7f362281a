//! dropship-deploy - Deployment library for single smart contracts.
//!
//! This crate resolves a network profile and its secrets from the environment, builds
//! an immutable deployment plan from a constructor argument template, drives that plan
//! through a [`ContractFactory`] and renders the terminal result.
//!
//! ```no_run
//! use dropship_deploy::{
//!     DropshipConfig, EvmContractFactory, Orchestrator, OutputFormat, ProcessEnv, build_plan,
//!     render, resolve, template_secrets,
//! };
//!
//! # async fn example() -> Result<(), dropship_deploy::DeployError> {
//! let config = DropshipConfig::load(None)?;
//! let registry = config.registry()?;
//! let template = &config.contract.constructor_args;
//!
//! let (network, secrets) =
//!     resolve(&registry, "sepolia", &template_secrets(template), &ProcessEnv)?;
//! let plan = build_plan(&config.contract.name, &network.profile, &secrets, template)?;
//!
//! let factory = EvmContractFactory::connect(&network, &secrets, config.factory_options())?;
//! let result = Orchestrator::new(factory).run(&plan).await;
//! println!("{}", render(&result, OutputFormat::Text).line);
//! # Ok(())
//! # }
//! ```

mod error;
pub use error::{DeployError, ErrorKind};

mod network;
pub use network::{
    HARDHAT_CHAIN_ID, HARDHAT_NETWORK, HARDHAT_RPC_URL, NetworkProfile, NetworkRegistry,
    RpcEndpoint, SEPOLIA_CHAIN_ID, SEPOLIA_NETWORK, SEPOLIA_RPC_URL, SEPOLIA_SIGNER,
};

mod secrets;
pub use secrets::{Environment, ProcessEnv, ResolvedNetwork, ResolvedSecrets, resolve};

mod plan;
pub use plan::{
    ArgDescriptor, ArgShape, CONTROL_CONTRACT_SECRET, ConstructorArgument, DEFAULT_BASE_URI,
    DEFAULT_CONTRACT_NAME, DeploymentPlan, SEADROP_SECRET, build_plan, check_address,
    default_constructor_template, template_secrets,
};

pub mod factory;
pub use factory::{
    ArtifactStore, ContractAddress, ContractArtifact, ContractFactory, EvmContractFactory,
    FactoryOptions, PendingDeployment,
};

mod orchestrator;
pub use orchestrator::{DeploymentState, Orchestrator};

mod report;
pub use report::{
    DeploymentResult, EXIT_CONFIGURATION, EXIT_DEPLOYMENT_FAILED, EXIT_SUCCESS, Outcome,
    OutputFormat, Report, format_argument, render, render_networks, render_plan,
};

mod config;
pub use config::{CONFIG_FILENAME, ContractConfig, DropshipConfig, ENV_PREFIX};

mod record;
pub use record::DeploymentRecord;
