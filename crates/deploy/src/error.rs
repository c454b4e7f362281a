//! Error taxonomy for a deployment invocation.
//!
//! Every variant is terminal: nothing in this crate retries. Automation tells
//! configuration mistakes apart from chain failures through [`ErrorKind`].

/// A terminal failure of the deployment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeployError {
    /// A secret required by the selected network or the constructor template is unset or empty.
    #[error("required secret `{0}` is not set in the environment")]
    MissingSecret(String),

    /// A constructor argument could not be produced from its descriptor.
    #[error("constructor argument #{index} is invalid: {reason}")]
    InvalidArgument { index: usize, reason: String },

    /// The contract artifact could not be loaded (or compiled).
    #[error("artifact for contract `{contract}` not found: {reason}")]
    ArtifactNotFound { contract: String, reason: String },

    /// Submission or confirmation of the deployment transaction failed.
    #[error("deployment failed: {0}")]
    DeploymentFailed(String),

    /// The network registry, configuration file or command line is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// The kind of a [`DeployError`], without its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    MissingSecret,
    InvalidArgument,
    ArtifactNotFound,
    DeploymentFailed,
    Configuration,
}

impl ErrorKind {
    /// Whether the failure stems from the operator's setup rather than from the chain.
    pub fn is_configuration_mistake(&self) -> bool {
        !matches!(self, ErrorKind::DeploymentFailed)
    }
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::MissingSecret(_) => ErrorKind::MissingSecret,
            DeployError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            DeployError::ArtifactNotFound { .. } => ErrorKind::ArtifactNotFound,
            DeployError::DeploymentFailed(_) => ErrorKind::DeploymentFailed,
            DeployError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn invalid_argument(index: usize, reason: impl Into<String>) -> Self {
        DeployError::InvalidArgument {
            index,
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator error, keeping its whole context chain.
    pub(crate) fn deployment_failed(err: &anyhow::Error) -> Self {
        DeployError::DeploymentFailed(format!("{err:#}"))
    }
}
