//! Secret resolution against the process environment.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use url::Url;

use crate::{DeployError, NetworkProfile, NetworkRegistry};

/// Read-only source of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Every secret a deployment needs, fully populated.
///
/// Values never appear in the `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedSecrets {
    values: BTreeMap<String, String>,
}

impl ResolvedSecrets {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("names", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A network profile with its RPC endpoint rendered.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedNetwork {
    pub profile: NetworkProfile,
    /// The rendered endpoint. It may embed secrets, so `Debug` shows the template instead.
    pub rpc_url: Url,
}

impl fmt::Debug for ResolvedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedNetwork")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Resolve `network` and every secret it (and `extra_secrets`) needs.
///
/// Secrets are checked in order: endpoint placeholders, signer keys, then
/// `extra_secrets`. The first one that is unset or blank aborts resolution with
/// [`DeployError::MissingSecret`]; nothing is defaulted.
pub fn resolve<E: Environment + ?Sized>(
    registry: &NetworkRegistry,
    network: &str,
    extra_secrets: &[String],
    env: &E,
) -> Result<(ResolvedNetwork, ResolvedSecrets), DeployError> {
    let profile = registry.get(network)?;

    let mut seen = HashSet::new();
    let required = profile
        .required_secrets()?
        .into_iter()
        .chain(extra_secrets.iter().cloned())
        .filter(|name| seen.insert(name.clone()));

    let mut values = BTreeMap::new();
    for name in required {
        match env.var(&name) {
            Some(value) if !value.trim().is_empty() => {
                values.insert(name, value);
            }
            _ => {
                tracing::debug!(network, secret = %name, "Required secret is missing");
                return Err(DeployError::MissingSecret(name));
            }
        }
    }
    let secrets = ResolvedSecrets { values };

    let rendered = profile
        .rpc_url
        .render_with(|name| secrets.get(name).map(str::to_string))
        .map_err(|e| DeployError::Configuration(format!("network `{network}`: {e}")))?;
    // The rendered URL embeds secrets, so the error must not echo it.
    let rpc_url = Url::parse(&rendered).map_err(|e| {
        DeployError::Configuration(format!(
            "network `{network}`: RPC URL `{}` is invalid once rendered: {e}",
            profile.rpc_url
        ))
    })?;

    tracing::debug!(
        network,
        chain_id = profile.chain_id,
        secrets = secrets.len(),
        "Network resolved"
    );

    Ok((
        ResolvedNetwork {
            profile: profile.clone(),
            rpc_url,
        },
        secrets,
    ))
}
