//! Compiled contract artifacts on disk.
//!
//! Both the Hardhat layout (`artifacts/contracts/<File>.sol/<Name>.json`, bytecode as a
//! hex string) and the Foundry layout (`out/<File>.sol/<Name>.json`, bytecode under
//! `object`) are understood.

use std::path::{Path, PathBuf};

use alloy_core::json_abi::JsonAbi;
use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory holding compiler metadata rather than contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";
/// Suffix of Hardhat debug files living next to artifacts.
const DEBUG_SUFFIX: &str = ".dbg.json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(Bytes),
    Object { object: Bytes },
}

impl BytecodeField {
    fn into_bytes(self) -> Bytes {
        match self {
            BytecodeField::Hex(bytes) | BytecodeField::Object { object: bytes } => bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawArtifact {
    abi: JsonAbi,
    bytecode: BytecodeField,
}

/// A contract's ABI and creation bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub path: PathBuf,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Parse an artifact file.
    pub fn load(contract_name: &str, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let raw: RawArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        let bytecode = raw.bytecode.into_bytes();
        if bytecode.is_empty() {
            anyhow::bail!(
                "{} has no creation bytecode (abstract contract or interface?)",
                path.display()
            );
        }

        Ok(Self {
            contract_name: contract_name.to_string(),
            path: path.to_path_buf(),
            abi: raw.abi,
            bytecode,
        })
    }
}

/// A directory of compiled artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find and load the artifact of `contract_name`.
    pub fn load(&self, contract_name: &str) -> Result<ContractArtifact> {
        let path = self.find(contract_name)?;
        tracing::debug!(
            contract = contract_name,
            path = %path.display(),
            "Found contract artifact"
        );
        ContractArtifact::load(contract_name, &path)
    }

    /// Locate `<contract_name>.json` below the store root.
    ///
    /// Exactly one match is expected; two contracts sharing a name in different
    /// sources are ambiguous.
    pub fn find(&self, contract_name: &str) -> Result<PathBuf> {
        if !self.root.is_dir() {
            anyhow::bail!("artifacts directory {} does not exist", self.root.display());
        }

        let file_name = format!("{contract_name}.json");
        let mut matches = Vec::new();
        collect_matches(&self.root, &file_name, &mut matches)?;
        matches.sort();

        match matches.len() {
            0 => anyhow::bail!("no {} under {}", file_name, self.root.display()),
            1 => Ok(matches.remove(0)),
            _ => anyhow::bail!(
                "{} is ambiguous, found: {}",
                file_name,
                matches
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

fn collect_matches(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if path.is_dir() {
            if name != BUILD_INFO_DIR {
                collect_matches(&path, file_name, matches)?;
            }
        } else if name == file_name && !name.ends_with(DEBUG_SUFFIX) {
            matches.push(path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    const ABI: &str = r#"[{"type":"constructor","stateMutability":"nonpayable","inputs":[{"name":"uri","type":"string","internalType":"string"}]}]"#;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    fn hardhat_artifact(bytecode: &str) -> String {
        format!(
            r#"{{"_format":"hh-sol-artifact-1","contractName":"Token","sourceName":"contracts/Token.sol","abi":{ABI},"bytecode":"{bytecode}","deployedBytecode":"0x","linkReferences":{{}},"deployedLinkReferences":{{}}}}"#
        )
    }

    #[test]
    fn test_load_hardhat_layout() {
        let dir = TempDir::new("dropship-artifacts").unwrap();
        let path = write(
            dir.path(),
            "contracts/Token.sol/Token.json",
            &hardhat_artifact("0x6080604052"),
        );
        write(dir.path(), "contracts/Token.sol/Token.dbg.json", "{}");
        write(dir.path(), "build-info/Token.json", "{}");

        let artifact = ArtifactStore::new(dir.path()).load("Token").unwrap();
        assert_eq!(artifact.path, path);
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(artifact.abi.constructor().unwrap().inputs.len(), 1);
    }

    #[test]
    fn test_load_foundry_layout() {
        let dir = TempDir::new("dropship-artifacts").unwrap();
        write(
            dir.path(),
            "Token.sol/Token.json",
            &format!(r#"{{"abi":{ABI},"bytecode":{{"object":"0x6080","linkReferences":{{}}}}}}"#),
        );

        let artifact = ArtifactStore::new(dir.path()).load("Token").unwrap();
        assert_eq!(artifact.bytecode.as_ref(), &[0x60, 0x80]);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new("dropship-artifacts").unwrap();
        write(dir.path(), "contracts/Other.sol/Other.json", &hardhat_artifact("0x60"));

        let err = ArtifactStore::new(dir.path()).load("Token").unwrap_err();
        assert!(err.to_string().contains("no Token.json"));
    }

    #[test]
    fn test_missing_directory() {
        let err = ArtifactStore::new("/nonexistent/dropship/artifacts")
            .find("Token")
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_ambiguous_artifact() {
        let dir = TempDir::new("dropship-artifacts").unwrap();
        write(dir.path(), "contracts/A.sol/Token.json", &hardhat_artifact("0x60"));
        write(dir.path(), "contracts/B.sol/Token.json", &hardhat_artifact("0x60"));

        let err = ArtifactStore::new(dir.path()).find("Token").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_empty_bytecode_is_not_deployable() {
        let dir = TempDir::new("dropship-artifacts").unwrap();
        write(dir.path(), "contracts/Token.sol/Token.json", &hardhat_artifact("0x"));

        let err = ArtifactStore::new(dir.path()).load("Token").unwrap_err();
        assert!(err.to_string().contains("no creation bytecode"));
    }
}
