//! Network profiles and the registry they are looked up in.
//!
//! The registry is validated as a whole when it is built, so a misconfigured
//! profile is reported at startup instead of half-way through a deployment.

use std::collections::{BTreeMap, HashSet};

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::DeployError;

/// Name of the built-in local development network.
pub const HARDHAT_NETWORK: &str = "hardhat";
/// Chain ID of the built-in local development network.
pub const HARDHAT_CHAIN_ID: u64 = 1337;
/// RPC endpoint of the built-in local development network.
pub const HARDHAT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Name of the built-in Sepolia network.
pub const SEPOLIA_NETWORK: &str = "sepolia";
/// Chain ID of Sepolia.
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
/// RPC endpoint template for Sepolia, served through Infura.
pub const SEPOLIA_RPC_URL: &str = "https://sepolia.infura.io/v3/${INFURA_API_KEY}";
/// Environment variable holding the Sepolia deployer key.
pub const SEPOLIA_SIGNER: &str = "PRIVATE_KEY_1";

/// Value substituted for placeholders when checking that a template yields a valid URL.
const PLACEHOLDER_PROBE: &str = "placeholder";

/// An RPC endpoint, possibly referencing environment variables as `${NAME}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RpcEndpoint(String);

impl RpcEndpoint {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn template(&self) -> &str {
        &self.0
    }

    /// The environment variables referenced by the template, in order of appearance.
    pub fn placeholders(&self) -> Result<Vec<String>, String> {
        let mut names = Vec::new();
        self.render_with(|name| {
            names.push(name.to_string());
            Some(String::new())
        })?;
        Ok(names)
    }

    /// Substitute every placeholder using `lookup`.
    ///
    /// Fails on a malformed template or on the first placeholder `lookup` cannot provide.
    pub fn render_with<F>(&self, mut lookup: F) -> Result<String, String>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut rendered = String::with_capacity(self.0.len());
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find("${") {
            rendered.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after
                .find('}')
                .ok_or_else(|| format!("unterminated placeholder in `{}`", self.0))?;
            let name = &after[..end];
            if !is_env_var_name(name) {
                return Err(format!("invalid placeholder `${{{name}}}` in `{}`", self.0));
            }
            let value = lookup(name).ok_or_else(|| format!("no value for `{name}`"))?;
            rendered.push_str(&value);
            rest = &after[end + 1..];
        }
        rendered.push_str(rest);

        Ok(rendered)
    }
}

/// A named target network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Name the operator selects the network by.
    pub name: String,
    /// Chain ID the RPC endpoint is expected to report.
    pub chain_id: u64,
    /// RPC endpoint template.
    pub rpc_url: RpcEndpoint,
    /// Environment variables holding signer private keys. The first is the deployer.
    ///
    /// When empty, the node's own unlocked accounts are used.
    #[serde(default)]
    pub signers: Vec<String>,
}

impl NetworkProfile {
    pub fn hardhat() -> Self {
        Self {
            name: HARDHAT_NETWORK.to_string(),
            chain_id: HARDHAT_CHAIN_ID,
            rpc_url: RpcEndpoint::new(HARDHAT_RPC_URL),
            signers: Vec::new(),
        }
    }

    pub fn sepolia() -> Self {
        Self {
            name: SEPOLIA_NETWORK.to_string(),
            chain_id: SEPOLIA_CHAIN_ID,
            rpc_url: RpcEndpoint::new(SEPOLIA_RPC_URL),
            signers: vec![SEPOLIA_SIGNER.to_string()],
        }
    }

    /// Environment variables this profile cannot work without: endpoint placeholders
    /// first, then signer keys, without duplicates.
    pub fn required_secrets(&self) -> Result<Vec<String>, DeployError> {
        let placeholders = self.rpc_url.placeholders().map_err(|e| {
            DeployError::Configuration(format!("network `{}`: {}", self.name, e))
        })?;

        let mut seen = HashSet::new();
        Ok(placeholders
            .into_iter()
            .chain(self.signers.iter().cloned())
            .filter(|name| seen.insert(name.clone()))
            .collect())
    }

    /// Check the profile is usable, independently of the environment.
    pub fn validate(&self) -> Result<(), DeployError> {
        let invalid = |reason: String| {
            DeployError::Configuration(format!("network `{}`: {}", self.name, reason))
        };

        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DeployError::Configuration(format!(
                "invalid network name `{}`: expected ASCII letters, digits, `-` or `_`",
                self.name
            )));
        }

        if self.chain_id == 0 {
            return Err(invalid("chain ID must not be zero".to_string()));
        }

        let probe = self
            .rpc_url
            .render_with(|_| Some(PLACEHOLDER_PROBE.to_string()))
            .map_err(&invalid)?;
        let url = Url::parse(&probe)
            .map_err(|e| invalid(format!("invalid RPC URL `{}`: {}", self.rpc_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!(
                "unsupported RPC URL scheme `{}`, expected http or https",
                url.scheme()
            )));
        }

        if let Some(signer) = self.signers.iter().find(|s| !is_env_var_name(s)) {
            return Err(invalid(format!("invalid signer variable name `{signer}`")));
        }

        Ok(())
    }
}

/// The table of known networks, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self {
            profiles: [NetworkProfile::hardhat(), NetworkProfile::sepolia()]
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }
}

impl NetworkRegistry {
    /// Build a registry from the built-in profiles plus `overrides`.
    ///
    /// An override with the name of a built-in replaces it. Two overrides sharing a name
    /// are rejected, as is any profile that fails validation.
    pub fn with_overrides(
        overrides: impl IntoIterator<Item = NetworkProfile>,
    ) -> Result<Self, DeployError> {
        let mut registry = Self::default();
        let mut overridden = HashSet::new();

        for profile in overrides {
            if !overridden.insert(profile.name.clone()) {
                return Err(DeployError::Configuration(format!(
                    "network `{}` is configured more than once",
                    profile.name
                )));
            }
            if registry.profiles.contains_key(&profile.name) {
                tracing::debug!(network = %profile.name, "Overriding built-in network profile");
            }
            registry.profiles.insert(profile.name.clone(), profile);
        }

        for profile in registry.profiles.values() {
            profile.validate()?;
        }

        Ok(registry)
    }

    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Result<&NetworkProfile, DeployError> {
        self.profiles.get(name).ok_or_else(|| {
            DeployError::Configuration(format!(
                "unknown network `{}`, known networks: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }
}

/// Whether `name` is a conventional environment variable name.
pub(crate) fn is_env_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
