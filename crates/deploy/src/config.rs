//! Layered configuration: built-in defaults, then `Dropship.toml`, then `DROPSHIP_*`
//! environment variables (nested keys separated by `__`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    ArgDescriptor, DEFAULT_CONTRACT_NAME, DeployError, FactoryOptions, NetworkProfile,
    NetworkRegistry, default_constructor_template,
};

/// Default name of the configuration file.
pub const CONFIG_FILENAME: &str = "Dropship.toml";
/// Prefix of environment variables overriding configuration keys.
pub const ENV_PREFIX: &str = "DROPSHIP_";

/// The contract to deploy and how its constructor arguments are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    /// Contract name, as found in the artifacts directory.
    pub name: String,
    /// Constructor arguments, in ABI order.
    pub constructor_args: Vec<ArgDescriptor>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONTRACT_NAME.to_string(),
            constructor_args: default_constructor_template(),
        }
    }
}

/// Everything configurable about a deployment, short of the secrets themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropshipConfig {
    pub contract: ContractConfig,
    /// Directory holding compiled artifacts.
    pub artifacts_dir: PathBuf,
    /// Command compiling the contracts, e.g. `["npx", "hardhat", "compile"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_command: Option<Vec<String>>,
    /// Confirmations to wait for after inclusion.
    pub confirmations: u64,
    /// Upper bound on the confirmation wait. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
    /// Additional networks, or replacements for built-in ones.
    #[serde(default)]
    pub networks: Vec<NetworkProfile>,
}

impl Default for DropshipConfig {
    fn default() -> Self {
        let factory = FactoryOptions::default();
        Self {
            contract: ContractConfig::default(),
            artifacts_dir: factory.artifacts_dir,
            compile_command: factory.compile_command,
            confirmations: factory.confirmations,
            confirmation_timeout_secs: None,
            networks: Vec::new(),
        }
    }
}

impl DropshipConfig {
    /// Load the configuration.
    ///
    /// With `path`, the file must exist. Without it, `Dropship.toml` in the working
    /// directory is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, DeployError> {
        let file = match path {
            Some(path) if !path.is_file() => {
                return Err(DeployError::Configuration(format!(
                    "configuration file {} not found",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(CONFIG_FILENAME),
        };

        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(&file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| DeployError::Configuration(e.to_string()))?;

        if config.confirmations == 0 {
            return Err(DeployError::Configuration(
                "confirmations must be at least 1".to_string(),
            ));
        }

        tracing::debug!(
            path = %file.display(),
            contract = %config.contract.name,
            networks = config.networks.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// The network registry: built-ins plus the configured networks, validated.
    pub fn registry(&self) -> Result<NetworkRegistry, DeployError> {
        NetworkRegistry::with_overrides(self.networks.iter().cloned())
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }

    pub fn factory_options(&self) -> FactoryOptions {
        FactoryOptions {
            artifacts_dir: self.artifacts_dir.clone(),
            compile_command: self.compile_command.clone(),
            confirmations: self.confirmations,
        }
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::{ArgShape, RpcEndpoint};

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = DropshipConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config, DropshipConfig::default());
            assert_eq!(config.contract.name, DEFAULT_CONTRACT_NAME);
            assert_eq!(config.contract.constructor_args.len(), 3);
            assert!(config.confirmation_timeout().is_none());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILENAME,
                r#"
                artifacts_dir = "out"
                compile_command = ["forge", "build"]
                confirmation_timeout_secs = 600

                [contract]
                name = "Token"
                constructor_args = [
                    { kind = "literal", value = "ipfs://x/" },
                    { kind = "secret", name = "OWNER", shape = "address" },
                    { kind = "repeatable", name = "ALLOWED" },
                ]

                [[networks]]
                name = "base-sepolia"
                chain_id = 84532
                rpc_url = "https://base-sepolia.g.alchemy.com/v2/${ALCHEMY_KEY}"
                signers = ["PRIVATE_KEY_1"]
                "#,
            )?;
            jail.set_env("DROPSHIP_CONFIRMATIONS", "3");

            let config = DropshipConfig::load(None).map_err(|e| e.to_string())?;
            assert_eq!(config.contract.name, "Token");
            assert_eq!(
                config.contract.constructor_args,
                vec![
                    ArgDescriptor::literal("ipfs://x/"),
                    ArgDescriptor::secret("OWNER", ArgShape::Address),
                    ArgDescriptor::repeatable("ALLOWED"),
                ]
            );
            assert_eq!(config.confirmations, 3);
            assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(600)));

            let options = config.factory_options();
            assert_eq!(options.artifacts_dir, PathBuf::from("out"));
            assert_eq!(
                options.compile_command,
                Some(vec!["forge".to_string(), "build".to_string()])
            );

            let registry = config.registry().map_err(|e| e.to_string())?;
            let base = registry.get("base-sepolia").map_err(|e| e.to_string())?;
            assert_eq!(
                base.rpc_url,
                RpcEndpoint::new("https://base-sepolia.g.alchemy.com/v2/${ALCHEMY_KEY}")
            );
            assert!(registry.get("sepolia").is_ok());
            Ok(())
        });
    }

    #[test]
    fn test_explicit_path_must_exist() {
        Jail::expect_with(|_jail| {
            let err = DropshipConfig::load(Some(Path::new("missing.toml"))).unwrap_err();
            assert!(matches!(err, DeployError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn test_malformed_file_is_a_configuration_error() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "confirmations = \"many\"")?;
            let err = DropshipConfig::load(Some(Path::new("custom.toml"))).unwrap_err();
            assert!(matches!(err, DeployError::Configuration(_)));
            Ok(())
        });
    }

    #[test]
    fn test_zero_confirmations_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("DROPSHIP_CONFIRMATIONS", "0");
            assert!(DropshipConfig::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_network_fails_at_registry_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILENAME,
                r#"
                [[networks]]
                name = "broken"
                chain_id = 0
                rpc_url = "http://localhost:8545"
                "#,
            )?;
            let config = DropshipConfig::load(None).map_err(|e| e.to_string())?;
            assert!(config.registry().is_err());
            Ok(())
        });
    }
}
