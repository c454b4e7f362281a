//! The contract factory seam: loading artifacts and submitting deployments.
//!
//! [`ContractFactory`] is what the orchestrator drives. [`EvmContractFactory`] is the
//! production implementation on top of alloy; tests substitute their own.

mod artifact;
mod evm;

pub use artifact::{ArtifactStore, ContractArtifact};
pub use evm::{EvmContractFactory, FactoryOptions};

use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};

use crate::ConstructorArgument;

/// Address of a deployed contract, exactly as reported by the factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A submitted deployment that has not been confirmed yet.
pub trait PendingDeployment {
    /// Hash of the deployment transaction.
    fn transaction_hash(&self) -> String;
}

/// Compiles or loads contract artifacts and deploys them.
///
/// Errors are returned as [`anyhow::Error`]; the orchestrator classifies them by the
/// stage they happened in.
pub trait ContractFactory {
    /// A loaded, deployable contract.
    type Artifact: Send + Sync;
    /// A submitted deployment transaction.
    type Pending: PendingDeployment + Send;

    /// Load (compiling first if configured) the artifact of `contract_name`.
    fn resolve_artifact(
        &self,
        contract_name: &str,
    ) -> impl std::future::Future<Output = anyhow::Result<Self::Artifact>> + Send;

    /// Submit a deployment of `artifact` with `args`, in order.
    fn deploy(
        &self,
        artifact: &Self::Artifact,
        args: &[ConstructorArgument],
    ) -> impl std::future::Future<Output = anyhow::Result<Self::Pending>> + Send;

    /// Wait until `pending` is included and return the new contract's address.
    fn await_confirmation(
        &self,
        pending: Self::Pending,
    ) -> impl std::future::Future<Output = anyhow::Result<ContractAddress>> + Send;
}
