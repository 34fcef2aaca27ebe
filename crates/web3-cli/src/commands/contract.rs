//! Contract build, deploy and call commands

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde_json::{json, Value};
use tracing::info;
use web3_sdk::abi::Abi;
use web3_sdk::assets::get_abi;
use web3_sdk::solc::{compile_solidity_string, Contract};
use web3_sdk::units::parse_big_int;
use web3_sdk::vyper::compile_vyper;
use web3_sdk::{tx, TxOptions, Wallet};

use super::{parse_address, query::print_receipt, Context};
use crate::output::{display_value, print_json, value_as_text, Output};
use crate::CliError;

/// Gas limit for deployments when none is given
pub const DEPLOY_GAS_LIMIT: u64 = 4_000_000;
/// Gas limit for contract calls when none is given
pub const CALL_GAS_LIMIT: u64 = 70_000;

/// Contract subcommands
#[derive(Debug, Subcommand)]
pub enum ContractCommand {
    /// Build a Solidity or Vyper contract
    Build {
        /// Source file (.sol or .vy)
        file: PathBuf,
        /// solc docker image tag, e.g. 0.5.16
        #[arg(short = 'c', long)]
        solc_version: Option<String>,
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// EVM version passed to solc
        #[arg(long)]
        evm_version: Option<String>,
        /// Enable the optimizer
        #[arg(long)]
        optimize: bool,
    },
    /// Deploy compiled bytecode, optionally with constructor arguments
    Deploy {
        /// Path or URL of the .bin file
        bin: String,
        /// Constructor arguments
        args: Vec<String>,
        /// Gas limit
        #[arg(long, default_value_t = DEPLOY_GAS_LIMIT)]
        gas_limit: u64,
    },
    /// Call a contract function
    Call {
        /// Function name
        #[arg(long)]
        function: String,
        /// Contract address
        #[arg(long, env = crate::ADDRESS_VAR)]
        address: Option<String>,
        /// ABI name, path or URL
        #[arg(long)]
        abi: String,
        /// Wei sent with the call
        #[arg(long)]
        amount: Option<String>,
        /// Wait for the receipt
        #[arg(long)]
        wait: bool,
        /// Render byte results as text
        #[arg(long)]
        to_string: bool,
        /// Gas limit
        #[arg(long, default_value_t = CALL_GAS_LIMIT)]
        gas_limit: u64,
        /// Function arguments
        args: Vec<String>,
    },
    /// List the functions of an ABI
    List {
        /// ABI name, path or URL
        #[arg(long)]
        abi: String,
    },
}

impl ContractCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        match self {
            ContractCommand::Build {
                file,
                solc_version,
                output,
                evm_version,
                optimize,
            } => {
                let solc_version = solc_version.or_else(|| ctx.settings.solc_version.clone());
                let evm_version = evm_version.unwrap_or_else(|| ctx.settings.evm_version.clone());
                build(
                    ctx,
                    &file,
                    solc_version.as_deref(),
                    output.as_deref(),
                    &evm_version,
                    optimize,
                )
                .await
            }
            ContractCommand::Deploy { bin, args, gas_limit } => deploy(ctx, &bin, &args, gas_limit).await,
            ContractCommand::Call {
                function,
                address,
                abi,
                amount,
                wait,
                to_string,
                gas_limit,
                args,
            } => {
                let call = Call {
                    function,
                    address,
                    amount,
                    wait,
                    to_string,
                    gas_limit,
                    args,
                };
                let abi = get_abi(&abi).await?;
                call_function(ctx, &abi, call).await
            }
            ContractCommand::List { abi } => list(ctx, &get_abi(&abi).await?),
        }
    }
}

async fn build(
    ctx: &Context,
    file: &Path,
    solc_version: Option<&str>,
    output: Option<&Path>,
    evm_version: &str,
    optimize: bool,
) -> Result<(), CliError> {
    let contracts = if file.extension().is_some_and(|ext| ext == "vy") {
        compile_vyper(file).await?
    } else {
        let source = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| CliError::context(&format!("Failed to read file {:?}", file), e))?;
        compile_solidity_string(&source, solc_version, evm_version, optimize)
            .await
            .map_err(|e| CliError::context("Failed to compile", e))?
    };

    let dir = output.unwrap_or_else(|| Path::new(""));
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)?;
    }

    let mut written = Vec::new();
    for (key, contract) in &contracts {
        let name = key.rsplit(':').next().unwrap_or(key);
        let (bin, abi) = write_contract(dir, name, contract)?;
        info!(contract = %name, "wrote contract artifacts");
        written.push((bin, abi));
    }

    if ctx.json() {
        let files: Vec<Value> = written
            .iter()
            .map(|(bin, abi)| json!({ "bin": bin, "abi": abi }))
            .collect();
        return print_json(&json!({ "source": file.display().to_string(), "contracts": files }));
    }
    println!("Successfully compiled contracts and wrote the following files:");
    println!("Source file {}", file.display());
    for (bin, abi) in written {
        println!(" {}, {}", bin, abi);
    }
    Ok(())
}

/// Write `<name>.bin` and `<name>.abi`, returning their paths
fn write_contract(dir: &Path, name: &str, contract: &Contract) -> Result<(String, String), CliError> {
    let bin_path = dir.join(format!("{}.bin", name));
    std::fs::write(&bin_path, &contract.code)
        .map_err(|e| CliError::context(&format!("Cannot write the bin file {:?}", bin_path), e))?;

    let abi_path = dir.join(format!("{}.abi", name));
    let abi = serde_json::to_string_pretty(&contract.info.abi_definition)?;
    std::fs::write(&abi_path, abi)
        .map_err(|e| CliError::context(&format!("Cannot write the abi file {:?}", abi_path), e))?;

    Ok((
        bin_path.display().to_string(),
        abi_path.display().to_string(),
    ))
}

/// ABI path next to a `.bin` file
fn abi_path_for(bin: &str) -> String {
    format!("{}.abi", bin.strip_suffix(".bin").unwrap_or(bin))
}

async fn read_bin(bin: &str) -> Result<String, CliError> {
    let text = if bin.starts_with("http://") || bin.starts_with("https://") {
        let resp = reqwest::get(bin).await?.error_for_status()?;
        resp.text().await?
    } else {
        tokio::fs::read_to_string(bin)
            .await
            .map_err(|e| CliError::context(&format!("Cannot read the bin file {:?}", bin), e))?
    };
    Ok(text.trim().to_string())
}

async fn deploy(ctx: &Context, bin: &str, args: &[String], gas_limit: u64) -> Result<(), CliError> {
    let private_key = ctx.settings.require_private_key()?;
    let code = read_bin(bin).await?;
    let abi = if args.is_empty() {
        None
    } else {
        Some(get_abi(&abi_path_for(bin)).await?)
    };
    let args: Vec<Value> = args.iter().cloned().map(Value::String).collect();

    let client = ctx.client().await?;
    let opts = TxOptions::default().gas_limit(gas_limit);
    let sent = tx::deploy_contract(&client, private_key, &code, abi.as_ref(), &args, &opts)
        .await
        .map_err(|e| CliError::context("Cannot deploy the contract", e))?;

    let receipt = ctx.wait_for_receipt(&client, &sent.hash).await?;
    if !receipt.is_success() {
        return Err(CliError::Failed(format!(
            "Contract deploy tx failed: {}. Did you pass in the correct constructor arguments?",
            sent.hash
        )));
    }

    if ctx.json() {
        return print_json(&receipt);
    }
    println!(
        "Contract has been successfully deployed with transaction: {}",
        receipt.transaction_hash
    );
    if let Some(address) = receipt.contract_address {
        println!("Contract address is: {}", address);
    }
    Ok(())
}

struct Call {
    function: String,
    address: Option<String>,
    amount: Option<String>,
    wait: bool,
    to_string: bool,
    gas_limit: u64,
    args: Vec<String>,
}

async fn call_function(ctx: &Context, abi: &Abi, call: Call) -> Result<(), CliError> {
    let method = abi.function(&call.function).ok_or_else(|| {
        CliError::InvalidInput(format!("There is no such function: {}", call.function))
    })?;
    let address = call
        .address
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(parse_address)
        .transpose()?;
    let args: Vec<Value> = call.args.into_iter().map(Value::String).collect();
    let client = ctx.client().await?;

    if method.is_constant() {
        let from = match &ctx.settings.private_key {
            Some(key) => Some(*Wallet::from_private_key(key)?.address()),
            None => None,
        };
        let results = tx::call_constant_function(
            &client,
            abi,
            address.as_ref(),
            &call.function,
            &args,
            from,
        )
        .await
        .map_err(|e| CliError::context("Error calling constant function", e))?;
        return print_call_results(ctx, &results, call.to_string);
    }

    let private_key = ctx.settings.require_private_key()?;
    let mut opts = TxOptions::default().gas_limit(call.gas_limit);
    if let Some(amount) = call.amount.as_deref().filter(|a| !a.is_empty()) {
        opts = opts.value(parse_big_int(amount)?);
    }
    let sent = tx::call_transact_function(
        &client,
        private_key,
        abi,
        address.as_ref(),
        &call.function,
        &args,
        &opts,
    )
    .await
    .map_err(|e| CliError::context("Error calling contract", e))?;

    if !call.wait {
        Output::new(ctx.json())
            .field("hash", sent.hash)
            .line(format!("Transaction hash: {}", sent.hash))
            .print();
        return Ok(());
    }
    if !ctx.json() {
        println!("Transaction hash: {}", sent.hash);
        println!("Waiting for receipt...");
    }
    let receipt = ctx.wait_for_receipt(&client, &sent.hash).await?;
    print_receipt(ctx, receipt, Some(abi))
}

fn print_call_results(ctx: &Context, results: &[Value], to_string: bool) -> Result<(), CliError> {
    let render = |v: &Value| {
        if to_string {
            Value::String(value_as_text(v))
        } else {
            v.clone()
        }
    };

    if ctx.json() {
        let response = match results {
            [single] => render(single),
            many => Value::Array(many.iter().map(render).collect()),
        };
        return print_json(&json!({ "response": response }));
    }
    for value in results {
        println!("{}", display_value(&render(value)));
    }
    Ok(())
}

fn function_lines(abi: &Abi) -> Vec<String> {
    let types = |params: &[web3_sdk::abi::Param]| {
        params
            .iter()
            .map(|p| p.kind.to_string())
            .collect::<Vec<_>>()
            .join(",")
    };
    let mut functions: Vec<_> = abi.functions.iter().collect();
    functions.sort_by(|a, b| a.name.cmp(&b.name));
    functions
        .into_iter()
        .map(|f| {
            let mut line = format!("function {}({}) {}", f.name, types(&f.inputs), f.state_mutability);
            if !f.outputs.is_empty() {
                line.push_str(&format!(" returns({})", types(&f.outputs)));
            }
            line
        })
        .collect()
}

fn list(ctx: &Context, abi: &Abi) -> Result<(), CliError> {
    if ctx.json() {
        let functions: Vec<Value> = abi
            .functions
            .iter()
            .map(|f| {
                json!({
                    "name": f.name,
                    "signature": f.signature(),
                    "stateMutability": f.state_mutability.to_string(),
                    "constant": f.is_constant(),
                })
            })
            .collect();
        return print_json(&functions);
    }
    for line in function_lines(abi) {
        println!("{}", line);
    }
    Ok(())
}
