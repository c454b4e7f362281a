//! Terminal results and how they are presented.
//!
//! Rendering is pure: the caller decides where the line goes and performs the
//! process exit using [`Outcome::exit_code`].

use comfy_table::{Table, presets::UTF8_FULL};
use serde_json::json;

use crate::{ConstructorArgument, ContractAddress, DeployError, DeploymentPlan, ErrorKind, NetworkRegistry};

/// Exit code of a successful deployment.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when submission or confirmation failed.
pub const EXIT_DEPLOYMENT_FAILED: u8 = 1;
/// Exit code for configuration mistakes (secrets, arguments, artifacts, settings).
pub const EXIT_CONFIGURATION: u8 = 2;

/// The terminal result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentResult {
    Success {
        contract_address: ContractAddress,
        transaction_hash: Option<String>,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
}

impl From<DeployError> for DeploymentResult {
    fn from(err: DeployError) -> Self {
        DeploymentResult::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl DeploymentResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentResult::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            DeploymentResult::Success { .. } => None,
            DeploymentResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// How results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Process-level outcome of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(ErrorKind),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Success => EXIT_SUCCESS,
            Outcome::Failure(ErrorKind::DeploymentFailed) => EXIT_DEPLOYMENT_FAILED,
            Outcome::Failure(_) => EXIT_CONFIGURATION,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// A rendered result, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The single line to print. Failures belong on stderr, successes on stdout.
    pub line: String,
    pub outcome: Outcome,
}

/// Render `result` as one line in `format`.
pub fn render(result: &DeploymentResult, format: OutputFormat) -> Report {
    match result {
        DeploymentResult::Success {
            contract_address,
            transaction_hash,
        } => {
            let line = match format {
                OutputFormat::Text => format!("Contract deployed to: {contract_address}"),
                OutputFormat::Json => json!({
                    "status": "success",
                    "address": contract_address,
                    "transaction_hash": transaction_hash,
                })
                .to_string(),
            };
            Report {
                line,
                outcome: Outcome::Success,
            }
        }
        DeploymentResult::Failure { kind, message } => {
            let line = match format {
                OutputFormat::Text => format!("error[{kind}]: {message}"),
                OutputFormat::Json => json!({
                    "status": "failure",
                    "kind": kind.to_string(),
                    "message": message,
                })
                .to_string(),
            };
            Report {
                line,
                outcome: Outcome::Failure(*kind),
            }
        }
    }
}

/// Human-readable form of a constructor argument.
pub fn format_argument(arg: &ConstructorArgument) -> String {
    match arg {
        ConstructorArgument::String(value) => format!("{value:?}"),
        ConstructorArgument::Address(value) => value.clone(),
        ConstructorArgument::AddressList(values) => format!("[{}]", values.join(", ")),
    }
}

/// Table summarising a plan, for dry runs.
pub fn render_plan(plan: &DeploymentPlan) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Kind", "Value"]);
    for (index, arg) in plan.constructor_args.iter().enumerate() {
        let kind = match arg {
            ConstructorArgument::String(_) => "string",
            ConstructorArgument::Address(_) => "address",
            ConstructorArgument::AddressList(_) => "address[]",
        };
        table.add_row(vec![index.to_string(), kind.to_string(), format_argument(arg)]);
    }

    format!(
        "Contract: {}\nNetwork:  {} (chain {})\n{}",
        plan.contract_name, plan.network.name, plan.network.chain_id, table
    )
}

/// Table listing the known networks.
pub fn render_networks(registry: &NetworkRegistry) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Network", "Chain ID", "RPC endpoint", "Signers"]);
    for profile in registry.profiles() {
        let signers = if profile.signers.is_empty() {
            "(node accounts)".to_string()
        } else {
            profile.signers.join(", ")
        };
        table.add_row(vec![
            profile.name.clone(),
            profile.chain_id.to_string(),
            profile.rpc_url.to_string(),
            signers,
        ]);
    }
    table.to_string()
}
