//! [`ContractFactory`] for EVM chains, built on alloy.

use std::path::PathBuf;

use alloy_core::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_core::primitives::{Address, Bytes};
use alloy_network::{Ethereum, EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};

use super::{ArtifactStore, ContractAddress, ContractArtifact, ContractFactory, PendingDeployment};
use crate::{ConstructorArgument, DeployError, ResolvedNetwork, ResolvedSecrets, check_address};

/// Default directory compiled artifacts are read from.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
/// Default number of confirmations to wait for.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Settings for [`EvmContractFactory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryOptions {
    /// Where compiled artifacts live.
    pub artifacts_dir: PathBuf,
    /// Command run before loading artifacts, if any.
    pub compile_command: Option<Vec<String>>,
    /// Number of blocks the deployment must be buried under.
    pub confirmations: u64,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            compile_command: None,
            confirmations: DEFAULT_CONFIRMATIONS,
        }
    }
}

/// Deploys artifacts through a JSON-RPC endpoint.
pub struct EvmContractFactory {
    provider: DynProvider<Ethereum>,
    /// Address of the first configured signer. `None` means the node's first account.
    deployer: Option<Address>,
    chain_id: u64,
    store: ArtifactStore,
    options: FactoryOptions,
}

impl EvmContractFactory {
    /// Connect to `network` with the signers its profile names.
    ///
    /// No request is made here; the endpoint is first contacted when deploying.
    pub fn connect(
        network: &ResolvedNetwork,
        secrets: &ResolvedSecrets,
        options: FactoryOptions,
    ) -> Result<Self, DeployError> {
        let signers = network
            .profile
            .signers
            .iter()
            .map(|name| {
                let key = secrets
                    .get(name)
                    .ok_or_else(|| DeployError::MissingSecret(name.clone()))?;
                let key = key.trim();
                key.strip_prefix("0x")
                    .unwrap_or(key)
                    .parse::<PrivateKeySigner>()
                    .map_err(|_| {
                        DeployError::Configuration(format!(
                            "`{name}` does not hold a valid private key"
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let deployer = signers.first().map(PrivateKeySigner::address);

        let builder = ProviderBuilder::new();
        let provider = match signers.split_first() {
            Some((first, rest)) => {
                let mut wallet = EthereumWallet::from(first.clone());
                for signer in rest {
                    wallet.register_signer(signer.clone());
                }
                builder
                    .wallet(wallet)
                    .connect_http(network.rpc_url.clone())
                    .erased()
            }
            None => builder.connect_http(network.rpc_url.clone()).erased(),
        };

        tracing::debug!(
            network = %network.profile.name,
            chain_id = network.profile.chain_id,
            signers = signers.len(),
            "Contract factory connected"
        );

        Ok(Self {
            provider,
            deployer,
            chain_id: network.profile.chain_id,
            store: ArtifactStore::new(options.artifacts_dir.clone()),
            options,
        })
    }

    async fn compile(&self, command: &[String]) -> Result<()> {
        let (program, args) = command
            .split_first()
            .context("Compile command must not be empty")?;
        let command_line = command.join(" ");

        tracing::info!(command = %command_line, "Compiling contracts...");

        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to run `{command_line}`"))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            tracing::debug!(target: "dropship::compile", "{}", line);
        }

        if !output.status.success() {
            anyhow::bail!(
                "`{}` exited with {}: {}",
                command_line,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }

    async fn deployer_address(&self) -> Result<Address> {
        if let Some(address) = self.deployer {
            return Ok(address);
        }

        let accounts = self
            .provider
            .get_accounts()
            .await
            .context("Failed to list node accounts")?;
        accounts
            .first()
            .copied()
            .context("No signer configured and the node exposes no unlocked account")
    }
}

impl PendingDeployment for PendingTransactionBuilder<Ethereum> {
    fn transaction_hash(&self) -> String {
        self.tx_hash().to_string()
    }
}

impl ContractFactory for EvmContractFactory {
    type Artifact = ContractArtifact;
    type Pending = PendingTransactionBuilder<Ethereum>;

    async fn resolve_artifact(&self, contract_name: &str) -> Result<ContractArtifact> {
        if let Some(command) = &self.options.compile_command {
            self.compile(command).await?;
        }

        self.store.load(contract_name)
    }

    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        args: &[ConstructorArgument],
    ) -> Result<PendingTransactionBuilder<Ethereum>> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .context("Failed to query chain ID")?;
        if chain_id != self.chain_id {
            anyhow::bail!(
                "RPC endpoint reports chain ID {}, expected {}",
                chain_id,
                self.chain_id
            );
        }

        let deployer = self.deployer_address().await?;
        let data = encode_deployment(artifact, args)?;

        tracing::info!(
            deployer = %deployer,
            contract = %artifact.contract_name,
            chain_id,
            "Deploying contract with the account"
        );

        let tx = TransactionRequest::default()
            .with_from(deployer)
            .with_deploy_code(data);

        self.provider
            .send_transaction(tx)
            .await
            .context("Failed to submit deployment transaction")
    }

    async fn await_confirmation(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<ContractAddress> {
        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .with_required_confirmations(self.options.confirmations)
            .get_receipt()
            .await
            .with_context(|| format!("Failed to confirm transaction {tx_hash}"))?;

        if !receipt.status() {
            anyhow::bail!("Deployment transaction {} reverted", tx_hash);
        }

        let address = receipt
            .contract_address()
            .with_context(|| format!("Receipt of {tx_hash} carries no contract address"))?;

        Ok(ContractAddress::new(address.to_checksum(None)))
    }
}

/// Creation bytecode followed by the ABI-encoded constructor arguments.
pub(crate) fn encode_deployment(
    artifact: &ContractArtifact,
    args: &[ConstructorArgument],
) -> Result<Bytes> {
    let values = args.iter().map(to_sol_value).collect::<Result<Vec<_>>>()?;

    let encoded = match artifact.abi.constructor() {
        Some(constructor) => constructor.abi_encode_input(&values).with_context(|| {
            format!(
                "Constructor arguments do not match the ABI of {}",
                artifact.contract_name
            )
        })?,
        None if values.is_empty() => Vec::new(),
        None => anyhow::bail!(
            "{} has no constructor but {} argument(s) were given",
            artifact.contract_name,
            values.len()
        ),
    };

    Ok(artifact.bytecode.iter().copied().chain(encoded).collect())
}

fn to_sol_value(arg: &ConstructorArgument) -> Result<DynSolValue> {
    Ok(match arg {
        ConstructorArgument::String(value) => DynSolValue::String(value.clone()),
        ConstructorArgument::Address(value) => DynSolValue::Address(parse_address(value)?),
        ConstructorArgument::AddressList(values) => DynSolValue::Array(
            values
                .iter()
                .map(|v| parse_address(v).map(DynSolValue::Address))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Parse a possibly short address, left-padding it to 20 bytes.
fn parse_address(value: &str) -> Result<Address> {
    check_address(value).map_err(anyhow::Error::msg)?;
    let digits = &value[2..];
    format!("0x{digits:0>40}")
        .parse::<Address>()
        .with_context(|| format!("Invalid address `{value}`"))
}
