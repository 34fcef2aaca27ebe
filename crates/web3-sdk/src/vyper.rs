//! Vyper compilation through a locally installed `vyper`

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::solc::{Contract, ContractInfo};
use crate::SdkError;

/// Version reported by `vyper --version`
pub async fn vyper_version() -> Result<String, SdkError> {
    let stdout = run_vyper(&["--version"]).await?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
}

/// Compile a Vyper source file.
///
/// The contract is keyed by its file stem.
pub async fn compile_vyper(path: &Path) -> Result<BTreeMap<String, Contract>, SdkError> {
    let version = vyper_version().await?;
    let path_str = path.to_string_lossy().to_string();
    debug!(path = %path_str, version = %version, "compiling vyper");

    let stdout = run_vyper(&["-f", "combined_json", &path_str]).await?;
    let source = tokio::fs::read_to_string(path).await?;
    parse_vyper_combined_json(&stdout, &source, &version)
}

/// Parse `vyper -f combined_json` output
pub fn parse_vyper_combined_json(
    output: &[u8],
    source: &str,
    version: &str,
) -> Result<BTreeMap<String, Contract>, SdkError> {
    let parsed: BTreeMap<String, Value> = serde_json::from_slice(output)
        .map_err(|e| SdkError::Compiler(format!("vyper: error reading output: {}", e)))?;

    let mut contracts = BTreeMap::new();
    for (file, info) in parsed {
        if !info.is_object() {
            // top level "version" entry
            continue;
        }
        let name = Path::new(&file)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file.clone());
        let field = |key: &str| info.get(key).and_then(Value::as_str).unwrap_or_default();

        contracts.insert(
            name,
            Contract {
                code: with_0x(field("bytecode")),
                runtime_code: with_0x(field("bytecode_runtime")),
                hashes: BTreeMap::new(),
                info: ContractInfo {
                    source: source.to_string(),
                    language: "Vyper".to_string(),
                    language_version: version.to_string(),
                    compiler_version: version.to_string(),
                    compiler_options: "-f combined_json".to_string(),
                    src_map: info.get("source_map").cloned().unwrap_or(Value::Null),
                    src_map_runtime: String::new(),
                    abi_definition: info.get("abi").cloned().unwrap_or(Value::Null),
                    user_doc: info.get("userdoc").cloned().unwrap_or(Value::Null),
                    developer_doc: info.get("devdoc").cloned().unwrap_or(Value::Null),
                    metadata: String::new(),
                },
            },
        );
    }
    Ok(contracts)
}

fn with_0x(code: &str) -> String {
    if code.starts_with("0x") {
        code.to_string()
    } else {
        format!("0x{}", code)
    }
}

async fn run_vyper(args: &[&str]) -> Result<Vec<u8>, SdkError> {
    let output = Command::new("vyper")
        .args(args)
        .output()
        .await
        .map_err(|e| SdkError::Compiler(format!("vyper: {}", e)))?;
    if !output.status.success() {
        return Err(SdkError::Compiler(format!(
            "vyper: {}\n{}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vyper_output() {
        let output = r#"{
            "contracts/Token.vy": {
                "abi": [{"name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"}],
                "bytecode": "0x6100",
                "bytecode_runtime": "0x6101"
            },
            "version": "0.3.10+commit.91361694"
        }"#;
        let contracts = parse_vyper_combined_json(output.as_bytes(), "# source", "0.3.10").unwrap();
        assert_eq!(contracts.len(), 1);

        let token = &contracts["Token"];
        assert_eq!(token.code, "0x6100");
        assert_eq!(token.runtime_code, "0x6101");
        assert_eq!(token.info.language, "Vyper");
        assert!(token.abi().unwrap().function("totalSupply").is_some());
    }

    #[test]
    fn test_parse_vyper_garbage() {
        let err = parse_vyper_combined_json(b"oops", "", "").unwrap_err();
        assert!(err.to_string().starts_with("vyper: error reading output"));
    }
}
