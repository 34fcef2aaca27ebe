//! CLI integration tests for web3-cli
//!
//! Tests command parsing, output formatting, and config handling. None of
//! these reach the network.

use std::path::Path;
use std::process::Command;

const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const KEY_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

/// Helper to run the CLI with a clean environment and `home` as `$HOME`
fn run_web3_in(home: &Path, args: &[&str], envs: &[(&str, &str)]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_web3"));
    for (key, _) in std::env::vars().filter(|(k, _)| k.starts_with("WEB3_")) {
        cmd.env_remove(key);
    }
    cmd.env_remove("RUST_LOG")
        .env("HOME", home)
        .envs(envs.iter().copied())
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn run_web3(args: &[&str]) -> std::process::Output {
    let home = tempfile::tempdir().unwrap();
    run_web3_in(home.path(), args, &[])
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help() {
    let output = run_web3(&["--help"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    for cmd in ["block", "transaction", "receipt", "balance", "transfer", "contract", "did", "claim"] {
        assert!(stdout.contains(cmd), "help is missing {}", cmd);
    }
}

#[test]
fn test_cli_version() {
    let output = run_web3(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("web3"));
}

#[test]
fn test_cli_contract_help() {
    let output = run_web3(&["contract", "--help"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("build"));
    assert!(stdout.contains("deploy"));
    assert!(stdout.contains("call"));
    assert!(stdout.contains("list"));
}

// ==================== Account Command Tests ====================

#[test]
fn test_account_create() {
    let output = run_web3(&["account", "create"]);
    assert!(output.status.success());
    let stdout = stdout(&output);
    assert!(stdout.contains("Private key: 0x"));
    assert!(stdout.contains("Public address: 0x"));
}

#[test]
fn test_account_create_json() {
    let output = run_web3(&["--format", "json", "account", "create"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["private_key"].as_str().unwrap().len(), 66);
    assert_eq!(json["address"].as_str().unwrap().len(), 42);
}

#[test]
fn test_account_keystore_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let keyfile = dir.path().join("key.json");
    let keyfile = keyfile.to_str().unwrap();

    let output = run_web3(&[
        "-f", "json", "account", "create", "--keystore", keyfile, "--password", "secret", "--light-kdf",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let created: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();

    let output = run_web3(&["-f", "json", "account", "extract", "--keyfile", keyfile, "--password", "secret"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let extracted: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(created["private_key"], extracted["private_key"]);
    assert_eq!(created["address"], extracted["address"]);

    let output = run_web3(&["account", "extract", "--keyfile", keyfile, "--password", "wrong"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("could not decrypt key with given password"));
}

#[test]
fn test_account_extract_missing_file() {
    let output = run_web3(&["account", "extract", "--keyfile", "/nonexistent/key.json", "--password", "x"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to read file"));
}

// ==================== Key & Environment Tests ====================

#[test]
fn test_myaddress() {
    let output = run_web3(&["--private-key", KEY, "myaddress"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), KEY_ADDRESS);
}

#[test]
fn test_myaddress_from_env() {
    let home = tempfile::tempdir().unwrap();
    let output = run_web3_in(home.path(), &["myaddress"], &[("WEB3_PRIVATE_KEY", KEY)]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), KEY_ADDRESS);
}

#[test]
fn test_myaddress_without_key() {
    let output = run_web3(&["myaddress"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("WEB3_PRIVATE_KEY not set"));
}

#[test]
fn test_env_lists_web3_vars() {
    let home = tempfile::tempdir().unwrap();
    let output = run_web3_in(
        home.path(),
        &["env"],
        &[("WEB3_NETWORK", "testnet"), ("WEB3_ADDRESS", "0x01")],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output), "WEB3_ADDRESS=0x01\nWEB3_NETWORK=testnet\n");
}

// ==================== Network & Config Tests ====================

#[test]
fn test_unknown_network() {
    let output = run_web3(&["--network", "nope", "id"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unrecognized network \"nope\""));
}

#[test]
fn test_conflicting_network_flags() {
    let output = run_web3(&["--testnet", "--rpc-url", "http://localhost:8545", "id"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Cannot set both rpcURL"));

    let output = run_web3(&["--testnet", "-n", "ethereum", "id"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Cannot set both network \"ethereum\" and testnet"));
}

#[test]
fn test_error_json_format() {
    let output = run_web3(&["-f", "json", "-n", "nope", "id"]);
    assert!(!output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("Unrecognized network"));
}

#[test]
fn test_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "output_format = \"json\"\n").unwrap();

    let output = run_web3(&["--config", path.to_str().unwrap(), "--pk", KEY, "myaddress"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["address"], KEY_ADDRESS);

    std::fs::write(&path, "network = \"nope\"\n").unwrap();
    let output = run_web3(&["--config", path.to_str().unwrap(), "id"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unrecognized network"));
}

#[test]
fn test_default_config_location() {
    let home = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(home.path().join(".web3")).unwrap();
    std::fs::write(home.path().join(".web3/config.toml"), "output_format = \"json\"\n").unwrap();

    let output = run_web3_in(home.path(), &["--pk", KEY, "myaddress"], &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("\"address\""));
}

// ==================== Transfer Tests ====================

#[test]
fn test_transfer_bad_arguments() {
    let output = run_web3(&["--pk", KEY, "transfer", "1", "0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid arguments. Format is: `transfer X to ADDRESS`"));

    let output = run_web3(&["--pk", KEY, "send", "1", "to", "0x1234"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid to 'address': 0x1234"));
}

#[test]
fn test_transfer_requires_key() {
    let output = run_web3(&["transfer", "1", "to", "0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("WEB3_PRIVATE_KEY not set"));
}

// ==================== Generate Tests ====================

#[test]
fn test_generate_erc20() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_web3(&[
        "generate",
        "contract",
        "erc20",
        "--symbol",
        "GOO",
        "--name",
        "Goo Token",
        "--cap",
        "1000",
        "--mintable",
        "-o",
        dir.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("The sample contract has been successfully written to"));

    let source = std::fs::read_to_string(dir.path().join("GOO.sol")).unwrap();
    assert!(source.contains("contract GOO is"));
    assert!(source.contains("ERC20Mintable"));
    assert!(source.contains("ERC20Capped(1000000000000000000000)"));
}

#[test]
fn test_generate_erc20_requires_symbol() {
    let output = run_web3(&["generate", "contract", "erc20", "--name", "Goo Token"]);
    assert!(!output.status.success());
}

// ==================== Claim Tests ====================

#[test]
fn test_claim_sign() {
    let output = run_web3(&[
        "--pk",
        KEY,
        "claim",
        "sign",
        "--id",
        "cred-1",
        "--type",
        "AgeCredential",
        "--issuer",
        "did:go:issuer",
        "--subject",
        "did:go:alice",
        "--data",
        r#"{"age": 30}"#,
    ]);
    assert!(output.status.success(), "{}", stderr(&output));

    let cred: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(cred["id"], "cred-1");
    assert_eq!(cred["issuer"], "did:go:issuer");
    assert_eq!(cred["credentialSubject"]["id"], "did:go:alice");
    assert_eq!(cred["credentialSubject"]["age"], 30);
    assert_eq!(cred["proof"]["creator"], "did:go:issuer#owner");
}

#[test]
fn test_claim_sign_bad_data() {
    let output = run_web3(&[
        "--pk", KEY, "claim", "sign", "--id", "c", "--type", "T", "--issuer", "did:go:a", "--subject",
        "did:go:b", "--data", "{oops",
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Cannot parse subject JSON data"));
}

#[test]
fn test_claim_verify_missing_file() {
    let output = run_web3(&["claim", "verify", "/nonexistent/cred.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Cannot read file"));
}
