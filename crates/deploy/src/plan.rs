//! Deployment plans and the constructor argument templates they are built from.

use serde::{Deserialize, Serialize};

use crate::{DeployError, NetworkProfile, ResolvedSecrets};

/// Contract deployed when no other is configured.
pub const DEFAULT_CONTRACT_NAME: &str = "PoliticalCorruptionPacksERC721Upgradable";
/// Base token URI passed as the first constructor argument of the default contract.
pub const DEFAULT_BASE_URI: &str = "ipfs://QmZfLyEWRAMTv6NkLUnUv5bAgnRp9vW8K6ZrLETJDHXQX9/";
/// Secret holding the controlling contract address.
pub const CONTROL_CONTRACT_SECRET: &str = "CONTROL_CONTRACT_ADDRESS";
/// Secret holding the SeaDrop address allowed to mint.
pub const SEADROP_SECRET: &str = "SEADROP_ADDRESS";

/// Maximum number of hex digits in an address.
const ADDRESS_HEX_DIGITS: usize = 40;

/// Shape a constructor argument value must have.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ArgShape {
    #[default]
    String,
    Address,
}

/// How one positional constructor argument is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ArgDescriptor {
    /// A fixed value.
    Literal {
        value: String,
        #[serde(default)]
        shape: ArgShape,
    },
    /// The value of a resolved secret.
    Secret {
        name: String,
        #[serde(default)]
        shape: ArgShape,
    },
    /// A secret holding a single address, passed as a one-element address list.
    Repeatable { name: String },
}

impl ArgDescriptor {
    pub fn literal(value: impl Into<String>) -> Self {
        ArgDescriptor::Literal {
            value: value.into(),
            shape: ArgShape::String,
        }
    }

    pub fn secret(name: impl Into<String>, shape: ArgShape) -> Self {
        ArgDescriptor::Secret {
            name: name.into(),
            shape,
        }
    }

    pub fn repeatable(name: impl Into<String>) -> Self {
        ArgDescriptor::Repeatable { name: name.into() }
    }

    /// The secret this descriptor reads, if any.
    pub fn secret_name(&self) -> Option<&str> {
        match self {
            ArgDescriptor::Literal { .. } => None,
            ArgDescriptor::Secret { name, .. } | ArgDescriptor::Repeatable { name } => {
                Some(name.as_str())
            }
        }
    }
}

/// The constructor template of the default contract, in ABI order.
pub fn default_constructor_template() -> Vec<ArgDescriptor> {
    vec![
        ArgDescriptor::literal(DEFAULT_BASE_URI),
        ArgDescriptor::secret(CONTROL_CONTRACT_SECRET, ArgShape::Address),
        ArgDescriptor::repeatable(SEADROP_SECRET),
    ]
}

/// Secrets referenced by `template`, in order, without duplicates.
pub fn template_secrets(template: &[ArgDescriptor]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in template.iter().filter_map(ArgDescriptor::secret_name) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// A positional constructor argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArgument {
    String(String),
    Address(String),
    AddressList(Vec<String>),
}

/// What to deploy, where, and with which arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    pub contract_name: String,
    pub network: NetworkProfile,
    pub constructor_args: Vec<ConstructorArgument>,
}

/// Build a [`DeploymentPlan`] by evaluating `template` against `secrets`.
///
/// Arguments come out in template order. A descriptor naming a secret absent from
/// `secrets`, or a value with the wrong shape, fails with
/// [`DeployError::InvalidArgument`] carrying its position.
pub fn build_plan(
    contract_name: &str,
    network: &NetworkProfile,
    secrets: &ResolvedSecrets,
    template: &[ArgDescriptor],
) -> Result<DeploymentPlan, DeployError> {
    if contract_name.trim().is_empty() {
        return Err(DeployError::Configuration(
            "contract name must not be empty".to_string(),
        ));
    }

    let lookup = |index: usize, name: &str| {
        secrets.get(name).map(str::to_string).ok_or_else(|| {
            DeployError::invalid_argument(index, format!("secret `{name}` is not resolved"))
        })
    };

    let constructor_args = template
        .iter()
        .enumerate()
        .map(|(index, descriptor)| match descriptor {
            ArgDescriptor::Literal { value, shape } => shaped(index, value.clone(), *shape),
            ArgDescriptor::Secret { name, shape } => shaped(index, lookup(index, name)?, *shape),
            ArgDescriptor::Repeatable { name } => {
                let value = lookup(index, name)?;
                check_address(&value).map_err(|r| DeployError::invalid_argument(index, r))?;
                Ok(ConstructorArgument::AddressList(vec![value]))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DeploymentPlan {
        contract_name: contract_name.to_string(),
        network: network.clone(),
        constructor_args,
    })
}

fn shaped(index: usize, value: String, shape: ArgShape) -> Result<ConstructorArgument, DeployError> {
    match shape {
        ArgShape::String => Ok(ConstructorArgument::String(value)),
        ArgShape::Address => {
            check_address(&value).map_err(|r| DeployError::invalid_argument(index, r))?;
            Ok(ConstructorArgument::Address(value))
        }
    }
}

/// Check `value` is `0x` followed by 1 to 40 hex digits.
///
/// Short forms denote the zero-padded 20-byte address, e.g. `0xCAFE`.
pub fn check_address(value: &str) -> Result<(), String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| format!("expected a 0x-prefixed address, got `{value}`"))?;

    if digits.is_empty() || digits.len() > ADDRESS_HEX_DIGITS {
        return Err(format!(
            "expected 1 to {ADDRESS_HEX_DIGITS} hex digits after 0x, got {} in `{value}`",
            digits.len()
        ));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("address contains non-hex characters: `{value}`"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{NetworkRegistry, resolve};

    fn secrets(pairs: &[(&str, &str)]) -> ResolvedSecrets {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let extra: Vec<String> = pairs.iter().map(|(k, _)| k.to_string()).collect();
        resolve(&NetworkRegistry::default(), "hardhat", &extra, &env)
            .unwrap()
            .1
    }

    #[test]
    fn test_default_template() {
        let secrets = secrets(&[
            (CONTROL_CONTRACT_SECRET, "0xCAFE"),
            (SEADROP_SECRET, "0xBEEF"),
        ]);
        let plan = build_plan(
            DEFAULT_CONTRACT_NAME,
            &NetworkProfile::hardhat(),
            &secrets,
            &default_constructor_template(),
        )
        .unwrap();

        assert_eq!(plan.contract_name, DEFAULT_CONTRACT_NAME);
        assert_eq!(
            plan.constructor_args,
            vec![
                ConstructorArgument::String(DEFAULT_BASE_URI.to_string()),
                ConstructorArgument::Address("0xCAFE".to_string()),
                ConstructorArgument::AddressList(vec!["0xBEEF".to_string()]),
            ]
        );
    }

    #[test]
    fn test_order_follows_template() {
        let secrets = secrets(&[("A", "a"), ("B", "0xb"), ("C", "0xc")]);
        let template = vec![
            ArgDescriptor::repeatable("C"),
            ArgDescriptor::secret("A", ArgShape::String),
            ArgDescriptor::literal("middle"),
            ArgDescriptor::secret("B", ArgShape::Address),
            ArgDescriptor::literal("last"),
        ];
        let plan = build_plan("Token", &NetworkProfile::hardhat(), &secrets, &template).unwrap();

        assert_eq!(
            plan.constructor_args,
            vec![
                ConstructorArgument::AddressList(vec!["0xc".to_string()]),
                ConstructorArgument::String("a".to_string()),
                ConstructorArgument::String("middle".to_string()),
                ConstructorArgument::Address("0xb".to_string()),
                ConstructorArgument::String("last".to_string()),
            ]
        );
    }

    #[test]
    fn test_repeatable_wraps_single_value() {
        let value = "0xABCD000000000000000000000000000000000001";
        let secrets = secrets(&[("ALLOWED", value)]);
        let plan = build_plan(
            "Token",
            &NetworkProfile::hardhat(),
            &secrets,
            &[ArgDescriptor::repeatable("ALLOWED")],
        )
        .unwrap();

        assert_eq!(
            plan.constructor_args,
            vec![ConstructorArgument::AddressList(vec![value.to_string()])]
        );
    }

    #[test]
    fn test_unresolved_secret_is_invalid_argument() {
        let secrets = secrets(&[("A", "a")]);
        let template = vec![
            ArgDescriptor::secret("A", ArgShape::String),
            ArgDescriptor::secret("NOT_RESOLVED", ArgShape::String),
        ];
        let err = build_plan("Token", &NetworkProfile::hardhat(), &secrets, &template).unwrap_err();
        assert!(matches!(err, DeployError::InvalidArgument { index: 1, .. }));
    }

    #[test]
    fn test_shape_check_reports_index() {
        let secrets = secrets(&[("OWNER", "not-an-address")]);
        let template = vec![
            ArgDescriptor::literal("uri"),
            ArgDescriptor::secret("OWNER", ArgShape::Address),
        ];
        let err = build_plan("Token", &NetworkProfile::hardhat(), &secrets, &template).unwrap_err();
        assert!(matches!(err, DeployError::InvalidArgument { index: 1, .. }));

        let err = build_plan(
            "Token",
            &NetworkProfile::hardhat(),
            &secrets,
            &[ArgDescriptor::repeatable("OWNER")],
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn test_literal_address_is_checked() {
        let template = vec![ArgDescriptor::Literal {
            value: "0xZZ".to_string(),
            shape: ArgShape::Address,
        }];
        let err = build_plan("Token", &NetworkProfile::hardhat(), &secrets(&[]), &template)
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidArgument { index: 0, .. }));
    }

    #[test]
    fn test_empty_contract_name() {
        let err = build_plan(" ", &NetworkProfile::hardhat(), &secrets(&[]), &[]).unwrap_err();
        assert!(matches!(err, DeployError::Configuration(_)));
    }

    #[test]
    fn test_check_address() {
        assert!(check_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8").is_ok());
        assert!(check_address("0xCAFE").is_ok());
        assert!(check_address("0Xbeef").is_ok());
        assert!(check_address("0x").is_err());
        assert!(check_address("CAFE").is_err());
        assert!(check_address("0x70997970C51812dc3A010C7d01b50e0d17dc79C8a").is_err());
        assert!(check_address("0xGG").is_err());
    }

    #[test]
    fn test_template_secrets() {
        let mut template = default_constructor_template();
        template.push(ArgDescriptor::secret(SEADROP_SECRET, ArgShape::Address));
        assert_eq!(
            template_secrets(&template),
            vec![CONTROL_CONTRACT_SECRET.to_string(), SEADROP_SECRET.to_string()]
        );
    }

    #[test]
    fn test_descriptor_deserializes_from_toml_shape() {
        let descriptors: Vec<ArgDescriptor> = serde_json::from_str(
            r#"[
                {"kind": "literal", "value": "ipfs://x/"},
                {"kind": "secret", "name": "OWNER", "shape": "address"},
                {"kind": "repeatable", "name": "ALLOWED"}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            descriptors,
            vec![
                ArgDescriptor::literal("ipfs://x/"),
                ArgDescriptor::secret("OWNER", ArgShape::Address),
                ArgDescriptor::repeatable("ALLOWED"),
            ]
        );
    }
}
