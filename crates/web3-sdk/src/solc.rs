//! Solidity compilation through the `ethereum/solc` docker image

use std::collections::BTreeMap;
use std::process::Stdio;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::abi::Abi;
use crate::SdkError;

const COMBINED_OUTPUTS: &str = "bin,bin-runtime,srcmap,srcmap-runtime,abi,userdoc,devdoc,metadata";

/// A compiled contract with its creation and runtime code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// 0x-prefixed creation bytecode
    pub code: String,
    /// 0x-prefixed runtime bytecode
    #[serde(rename = "runtime-code")]
    pub runtime_code: String,
    #[allow(missing_docs)]
    pub info: ContractInfo,
    /// Function signature to selector hex, when the compiler reports it
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hashes: BTreeMap<String, String>,
}

impl Contract {
    /// The parsed ABI definition
    pub fn abi(&self) -> Result<Abi, SdkError> {
        Abi::from_value(self.info.abi_definition.clone())
    }
}

/// How a contract was compiled, plus the compiler's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ContractInfo {
    pub source: String,
    pub language: String,
    pub language_version: String,
    pub compiler_version: String,
    pub compiler_options: String,
    pub src_map: Value,
    pub src_map_runtime: String,
    pub abi_definition: Value,
    pub user_doc: Value,
    pub developer_doc: Value,
    pub metadata: String,
}

/// Compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solidity {
    /// Executable used to run the compiler
    pub path: String,
    /// Full `major.minor.patch` version, used as the image tag
    pub version: String,
    /// `--evm-version`, omitted when empty
    pub evm_version: String,
    #[allow(missing_docs)]
    pub major: u32,
    #[allow(missing_docs)]
    pub minor: u32,
    #[allow(missing_docs)]
    pub patch: u32,
    /// Pass `--optimize`
    pub optimize: bool,
}

impl Solidity {
    fn args(&self) -> Result<Vec<String>, SdkError> {
        let dir = std::env::current_dir()?;
        let mut args = vec![
            "run".to_string(),
            "-i".to_string(),
            "--rm".to_string(),
            "-v".to_string(),
            format!("{}:/workdir", dir.display()),
            "-w".to_string(),
            "/workdir".to_string(),
            format!("ethereum/solc:{}", self.version),
            "--combined-json".to_string(),
            COMBINED_OUTPUTS.to_string(),
        ];
        if !self.evm_version.is_empty() {
            args.push("--evm-version".to_string());
            args.push(self.evm_version.clone());
        }
        if self.optimize {
            args.push("--optimize".to_string());
        }
        Ok(args)
    }
}

/// Find the first `x.y.z` version in `source`, usually the pragma
pub fn solidity_version(source: &str) -> Result<Solidity, SdkError> {
    let re = Regex::new(r"([0-9]+)\.([0-9]+)\.([0-9]+)")
        .map_err(|e| SdkError::Compiler(e.to_string()))?;
    let caps = re
        .captures(source)
        .ok_or_else(|| SdkError::Compiler(format!("can't parse solc version {:?}", source)))?;
    let part = |i: usize| -> Result<u32, SdkError> {
        caps[i]
            .parse()
            .map_err(|e| SdkError::Compiler(format!("can't parse solc version: {}", e)))
    };
    let (major, minor, patch) = (part(1)?, part(2)?, part(3)?);

    Ok(Solidity {
        path: "docker".to_string(),
        version: format!("{}.{}.{}", major, minor, patch),
        major,
        minor,
        patch,
        ..Default::default()
    })
}

/// Compile every contract in `source`.
///
/// The compiler version comes from `solc_version` when given, otherwise from
/// the source's pragma. Contracts are keyed `<stdin>:<Name>`.
pub async fn compile_solidity_string(
    source: &str,
    solc_version: Option<&str>,
    evm_version: &str,
    optimize: bool,
) -> Result<BTreeMap<String, Contract>, SdkError> {
    if source.is_empty() {
        return Err(SdkError::Compiler("solc: empty source string".to_string()));
    }
    let mut solc = match solc_version {
        Some(v) if !v.is_empty() => Solidity {
            path: "docker".to_string(),
            version: v.to_string(),
            ..Default::default()
        },
        _ => solidity_version(source)?,
    };
    solc.evm_version = evm_version.to_string();
    solc.optimize = optimize;

    let mut args = solc.args()?;
    let options = args.join(" ");
    args.push("--".to_string());
    args.push("-".to_string());
    debug!(version = %solc.version, "compiling solidity");

    let mut child = tokio::process::Command::new(&solc.path)
        .args(&args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| SdkError::Compiler(format!("solc: {}", e)))?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes()).await?;
    }
    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Err(SdkError::Compiler(format!(
            "solc: {}\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }

    parse_combined_json(&output.stdout, source, &solc.version, &solc.version, &options)
}

#[derive(Deserialize)]
struct CombinedOutput {
    #[serde(default)]
    contracts: BTreeMap<String, CombinedContract>,
}

#[derive(Deserialize)]
struct CombinedContract {
    #[serde(default)]
    bin: String,
    #[serde(rename = "bin-runtime", default)]
    bin_runtime: String,
    #[serde(rename = "srcmap", default)]
    src_map: Value,
    #[serde(rename = "srcmap-runtime", default)]
    src_map_runtime: String,
    #[serde(default)]
    abi: Value,
    #[serde(default)]
    devdoc: Value,
    #[serde(default)]
    userdoc: Value,
    #[serde(default)]
    metadata: String,
    #[serde(default)]
    hashes: BTreeMap<String, String>,
}

/// Parse `solc --combined-json` output.
///
/// Before 0.8 the ABI and docs are JSON-encoded strings; from 0.8 on they
/// are inline JSON and selector hashes may be included. Both are accepted.
pub fn parse_combined_json(
    combined_json: &[u8],
    source: &str,
    language_version: &str,
    compiler_version: &str,
    compiler_options: &str,
) -> Result<BTreeMap<String, Contract>, SdkError> {
    let output: CombinedOutput = serde_json::from_slice(combined_json)
        .map_err(|e| SdkError::Compiler(format!("solc: error reading output: {}", e)))?;

    let mut contracts = BTreeMap::new();
    for (name, info) in output.contracts {
        let abi = embedded_json(info.abi, "abi definition")?;
        let user_doc = embedded_json(info.userdoc, "user doc")?;
        let developer_doc = embedded_json(info.devdoc, "dev doc")?;
        contracts.insert(
            name,
            Contract {
                code: format!("0x{}", info.bin),
                runtime_code: format!("0x{}", info.bin_runtime),
                hashes: info.hashes,
                info: ContractInfo {
                    source: source.to_string(),
                    language: "Solidity".to_string(),
                    language_version: language_version.to_string(),
                    compiler_version: compiler_version.to_string(),
                    compiler_options: compiler_options.to_string(),
                    src_map: info.src_map,
                    src_map_runtime: info.src_map_runtime,
                    abi_definition: abi,
                    user_doc,
                    developer_doc,
                    metadata: info.metadata,
                },
            },
        );
    }
    Ok(contracts)
}

fn embedded_json(value: Value, what: &str) -> Result<Value, SdkError> {
    match value {
        Value::String(s) if s.is_empty() => Ok(Value::Null),
        Value::String(s) => serde_json::from_str(&s)
            .map_err(|e| SdkError::Compiler(format!("solc: error reading {}: {}", what, e))),
        other => Ok(other),
    }
}
