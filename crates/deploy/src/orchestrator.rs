//! Drives a [`DeploymentPlan`] through a [`ContractFactory`].
//!
//! The orchestrator walks a fixed state machine:
//!
//! ```text
//! Idle -> ArtifactResolving -> Submitting -> AwaitingConfirmation -> Confirmed
//!                 \                  \                 \
//!                  +------------------+-----------------+-> Failed
//! ```
//!
//! `Confirmed` and `Failed` are terminal. Nothing is retried: a failed deployment must be
//! started again from scratch, and doing so creates a new contract at a new address.

use std::time::Duration;

use crate::{
    ContractFactory, DeployError, DeploymentPlan, DeploymentResult, PendingDeployment,
};

/// Where an orchestrated deployment currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DeploymentState {
    Idle,
    ArtifactResolving,
    Submitting,
    AwaitingConfirmation,
    Confirmed,
    Failed,
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Confirmed | DeploymentState::Failed)
    }
}

/// Runs a single deployment.
pub struct Orchestrator<F> {
    factory: F,
    confirmation_timeout: Option<Duration>,
    state: DeploymentState,
    history: Vec<DeploymentState>,
}

impl<F: ContractFactory> Orchestrator<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            confirmation_timeout: None,
            state: DeploymentState::Idle,
            history: vec![DeploymentState::Idle],
        }
    }

    /// Bound the wait for confirmation. Unbounded when `None` (the default).
    pub fn confirmation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    pub fn state(&self) -> DeploymentState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[DeploymentState] {
        &self.history
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    fn transition(&mut self, next: DeploymentState) {
        if self.state.is_terminal() {
            tracing::warn!(from = %self.state, to = %next, "Ignoring transition out of a terminal state");
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "Deployment state transition");
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: DeployError) -> DeploymentResult {
        // Reported to the operator by the driver.
        tracing::debug!(kind = %err.kind(), error = %err, "Deployment failed");
        self.transition(DeploymentState::Failed);
        DeploymentResult::from(err)
    }

    /// Deploy `plan` and wait for it to be confirmed.
    ///
    /// An orchestrator runs at most one plan; running it again after it reached a
    /// terminal state fails without touching the factory.
    pub async fn run(&mut self, plan: &DeploymentPlan) -> DeploymentResult {
        if self.state != DeploymentState::Idle {
            return DeploymentResult::from(DeployError::Configuration(format!(
                "orchestrator already ran (state: {})",
                self.state
            )));
        }

        tracing::info!(
            contract = %plan.contract_name,
            network = %plan.network.name,
            chain_id = plan.network.chain_id,
            args = plan.constructor_args.len(),
            "Starting deployment"
        );

        self.transition(DeploymentState::ArtifactResolving);
        let artifact = match self.factory.resolve_artifact(&plan.contract_name).await {
            Ok(artifact) => artifact,
            Err(e) => {
                return self.fail(DeployError::ArtifactNotFound {
                    contract: plan.contract_name.clone(),
                    reason: format!("{e:#}"),
                });
            }
        };

        self.transition(DeploymentState::Submitting);
        let pending = match self
            .factory
            .deploy(&artifact, &plan.constructor_args)
            .await
        {
            Ok(pending) => pending,
            Err(e) => return self.fail(DeployError::deployment_failed(&e)),
        };
        let transaction_hash = pending.transaction_hash();
        tracing::info!(tx_hash = %transaction_hash, "Deployment transaction submitted");

        self.transition(DeploymentState::AwaitingConfirmation);
        let confirmation = self.factory.await_confirmation(pending);
        let confirmed = match self.confirmation_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, confirmation).await {
                Ok(confirmed) => confirmed,
                Err(_) => Err(anyhow::anyhow!(
                    "no confirmation for {} after {}s",
                    transaction_hash,
                    timeout.as_secs()
                )),
            },
            None => confirmation.await,
        };

        match confirmed {
            Ok(contract_address) => {
                self.transition(DeploymentState::Confirmed);
                tracing::info!(
                    address = %contract_address,
                    tx_hash = %transaction_hash,
                    "Deployment confirmed"
                );
                DeploymentResult::Success {
                    contract_address,
                    transaction_hash: Some(transaction_hash),
                }
            }
            Err(e) => self.fail(DeployError::deployment_failed(&e)),
        }
    }
}
