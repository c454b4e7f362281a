//! Records of successful deployments, kept next to the project for later reference.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{ConstructorArgument, ContractAddress, DeploymentPlan};

/// What was deployed where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub network: String,
    pub chain_id: u64,
    pub address: ContractAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    pub constructor_args: serde_json::Value,
    /// RFC 3339 timestamp of when the record was written.
    pub deployed_at: String,
    /// Version of the tool that performed the deployment.
    pub dropship_version: String,
}

impl DeploymentRecord {
    pub fn new(
        plan: &DeploymentPlan,
        address: ContractAddress,
        transaction_hash: Option<String>,
    ) -> Self {
        Self {
            contract_name: plan.contract_name.clone(),
            network: plan.network.name.clone(),
            chain_id: plan.network.chain_id,
            address,
            transaction_hash,
            constructor_args: args_to_json(&plan.constructor_args),
            deployed_at: chrono::Utc::now().to_rfc3339(),
            dropship_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Where this record lives below `dir`: `<dir>/<network>/<contract>.json`.
    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.network)
            .join(format!("{}.json", self.contract_name))
    }

    /// Write the record below `dir`, replacing any previous one for the same
    /// contract and network.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = self.path_in(dir);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize deployment record")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write deployment record to {}", path.display()))?;

        tracing::info!(path = %path.display(), "Deployment record saved");
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment record {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment record {}", path.display()))
    }
}

fn args_to_json(args: &[ConstructorArgument]) -> serde_json::Value {
    serde_json::Value::Array(
        args.iter()
            .map(|arg| match arg {
                ConstructorArgument::String(v) | ConstructorArgument::Address(v) => {
                    serde_json::Value::String(v.clone())
                }
                ConstructorArgument::AddressList(values) => serde_json::Value::Array(
                    values.iter().cloned().map(serde_json::Value::String).collect(),
                ),
            })
            .collect(),
    )
}
