//! Chain query commands

use clap::{Subcommand, ValueEnum};
use serde_json::json;
use web3_sdk::abi::{parse_logs, Abi};
use web3_sdk::assets::get_abi;
use web3_sdk::types::BlockId;
use web3_sdk::units::{format_units, wei_as_base, wei_as_gwei};
use web3_sdk::{tx, Block, BlockTransactions, Receipt, Transaction, Wallet};

use super::{parse_address, parse_hash, value_to_u256, Context};
use crate::output::{print_json, Output};
use crate::CliError;

/// How block transactions are listed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TxFormat {
    Count,
    Hash,
    Detail,
}

/// How transaction input data is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Len,
    Hex,
    Utf8,
}

/// Query subcommands
#[derive(Debug, Subcommand)]
pub enum QueryCommand {
    /// Block details for a block number (decimal integer) or hash (hexadecimal with 0x prefix). Omit for latest.
    #[command(visible_alias = "bl")]
    Block {
        /// Block number or hash
        number_or_hash: Option<String>,
        /// Transaction format
        #[arg(long = "tx", value_enum, default_value_t = TxFormat::Count)]
        tx_format: TxFormat,
        /// Transaction input data format
        #[arg(long, value_enum, default_value_t = InputFormat::Len)]
        input: InputFormat,
    },
    /// Transaction details for a tx hash
    #[command(visible_alias = "tx")]
    Transaction {
        /// Transaction hash
        hash: String,
        /// Transaction input data format
        #[arg(long, value_enum, default_value_t = InputFormat::Len)]
        input: InputFormat,
    },
    /// Transaction receipt for a tx hash
    #[command(visible_alias = "rc")]
    Receipt {
        /// Transaction hash
        hash: String,
        /// ABI used to decode the receipt logs
        #[arg(long)]
        abi: Option<String>,
    },
    /// Account details for an address, or the one of the private key
    #[command(visible_alias = "addr")]
    Address {
        /// Address to query
        address: Option<String>,
    },
    /// Balance of an address, or of the private key's address
    Balance {
        /// Address to query
        #[arg(value_name = "ADDRESS")]
        account: Option<String>,
        /// Query an ERC20 token balance instead
        #[arg(long)]
        erc20: bool,
        /// ERC20 contract address
        #[arg(long = "address", env = crate::ADDRESS_VAR)]
        contract: Option<String>,
    },
    /// Clique snapshot
    #[command(visible_alias = "sn")]
    Snapshot,
    /// Network and chain information
    Id,
    /// Address of the configured private key
    Myaddress,
}

impl QueryCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        match self {
            QueryCommand::Block {
                number_or_hash,
                tx_format,
                input,
            } => block(ctx, number_or_hash.as_deref().unwrap_or(""), tx_format, input).await,
            QueryCommand::Transaction { hash, input } => transaction(ctx, &hash, input).await,
            QueryCommand::Receipt { hash, abi } => receipt(ctx, &hash, abi.as_deref()).await,
            QueryCommand::Address { address } => address_details(ctx, address, false).await,
            QueryCommand::Balance {
                account,
                erc20,
                contract,
            } => {
                if erc20 {
                    let contract = contract.filter(|c| !c.is_empty()).ok_or_else(|| {
                        CliError::InvalidInput("You must set ERC20 contract address".to_string())
                    })?;
                    erc20_balance(ctx, account, &contract).await
                } else {
                    address_details(ctx, account, true).await
                }
            }
            QueryCommand::Snapshot => snapshot(ctx).await,
            QueryCommand::Id => id(ctx).await,
            QueryCommand::Myaddress => my_address(ctx),
        }
    }
}

async fn block(
    ctx: &Context,
    number_or_hash: &str,
    tx_format: TxFormat,
    input: InputFormat,
) -> Result<(), CliError> {
    let client = ctx.client().await?;
    let include_txs = tx_format == TxFormat::Detail;

    let block = if number_or_hash.starts_with("0x") {
        client.get_block_by_hash(&parse_hash(number_or_hash)?, include_txs).await
    } else {
        let id: BlockId = number_or_hash.parse().map_err(|e| {
            CliError::context(
                &format!(
                    "Block argument must be a number (decimal integer) or hash (hexadecimal with 0x prefix) {:?}",
                    number_or_hash
                ),
                e,
            )
        })?;
        client.get_block_by_number(id, include_txs).await
    }
    .map_err(|e| CliError::context("Cannot get block details from the network", e))?;

    if ctx.json() {
        return print_json(&block);
    }
    for line in block_lines(&block, tx_format, input, &ctx.settings.endpoint.unit) {
        println!("{}", line);
    }
    Ok(())
}

fn block_lines(block: &Block, tx_format: TxFormat, input: InputFormat, unit: &str) -> Vec<String> {
    let gas_pct = if block.gas_limit == 0 {
        0.0
    } else {
        block.gas_used as f64 * 100.0 / block.gas_limit as f64
    };
    let nonce = block
        .nonce
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

    let mut lines = vec![
        format!("Number: {}", block.number),
        format!("Time: {}", block.time().to_rfc3339()),
        format!("Transactions: {}", block.tx_count()),
        format!("Gas Used: {}/{} ({:.2}%)", block.gas_used, block.gas_limit, gas_pct),
        format!("Difficulty: {}", block.difficulty),
        format!(
            "Total Difficulty: {}",
            block
                .total_difficulty
                .map(|d| d.to_string())
                .unwrap_or_default()
        ),
        format!("Hash: {}", block.hash),
        format!("Vanity: {}", block.extra_vanity()),
        format!("Coinbase: {}", block.miner),
        format!("ParentHash: {}", block.parent_hash),
        format!("UncleHash: {}", block.sha3_uncles),
        format!("Nonce: {}", nonce),
        format!("Root: {}", block.state_root),
        format!("TxHash: {}", block.transactions_root),
        format!("ReceiptHash: {}", block.receipts_root),
        format!("Bloom: 0x{}", hex::encode(&block.logs_bloom)),
        format!("MixDigest: {}", block.mix_hash),
    ];
    if !block.signers.is_empty() {
        lines.push(format!("Signers: {}", join_addresses(&block.signers)));
    }
    if !block.voters.is_empty() {
        lines.push(format!("Voters: {}", join_addresses(&block.voters)));
    }
    if let Some(signer) = block.signer.as_ref().filter(|s| !s.is_empty()) {
        lines.push(format!("Signer: 0x{}", hex::encode(signer)));
    }

    match (&block.transactions, tx_format) {
        (BlockTransactions::Hashes(hashes), TxFormat::Hash) if !hashes.is_empty() => {
            lines.push("Transaction Hashes:".to_string());
            for (i, hash) in hashes.iter().enumerate() {
                lines.push(format!("\t{}\t{}", i, hash));
            }
        }
        (BlockTransactions::Full(txs), TxFormat::Detail) if !txs.is_empty() => {
            lines.push("Transaction Details:".to_string());
            for (i, tx) in txs.iter().enumerate() {
                lines.push(format!(
                    "\t{}\tHash: {} From: {} To: {} Value: {} {} Nonce: {} Gas Limit: {} Gas Price: {} gwei {}",
                    i,
                    tx.hash,
                    tx.from,
                    tx.to.map(|a| a.to_string()).unwrap_or_default(),
                    wei_as_base(&tx.value),
                    unit,
                    tx.nonce,
                    tx.gas_limit,
                    wei_as_gwei(&tx.gas_price),
                    input_data(&tx.input, input)
                ));
            }
        }
        _ => {}
    }
    lines
}

fn join_addresses(addresses: &[web3_sdk::Address]) -> String {
    let list: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
    format!("[{}]", list.join(", "))
}

fn input_data(data: &[u8], format: InputFormat) -> String {
    match format {
        InputFormat::Len => format!("Input Length: {} bytes", data.len()),
        InputFormat::Hex => format!("Input: 0x{}", hex::encode(data)),
        InputFormat::Utf8 => format!("Input: {}", String::from_utf8_lossy(data)),
    }
}

async fn transaction(ctx: &Context, hash: &str, input: InputFormat) -> Result<(), CliError> {
    let client = ctx.client().await?;
    let tx = client.get_transaction(&parse_hash(hash)?).await.map_err(|e| {
        CliError::context(
            &format!(
                "Cannot get transaction details from {} network",
                ctx.settings.endpoint.name.as_deref().unwrap_or("the")
            ),
            e,
        )
    })?;

    if ctx.json() {
        return print_json(&tx);
    }
    for line in transaction_lines(&tx, input, &ctx.settings.endpoint.unit) {
        println!("{}", line);
    }
    Ok(())
}

fn transaction_lines(tx: &Transaction, input: InputFormat, unit: &str) -> Vec<String> {
    let mut lines = vec![format!("Hash: {}", tx.hash), format!("From: {}", tx.from)];
    if let Some(to) = &tx.to {
        lines.push(format!("To: {}", to));
    }
    lines.push(format!("Value: {} {}", wei_as_base(&tx.value), unit));
    lines.push(format!("Nonce: {}", tx.nonce));
    lines.push(format!("Gas Limit: {}", tx.gas_limit));
    lines.push(format!("Gas Price: {} gwei", wei_as_gwei(&tx.gas_price)));
    match (tx.block_number, tx.block_hash) {
        (Some(number), Some(hash)) if !hash.is_zero() => {
            lines.push(format!("Block Number: {}", number));
            lines.push(format!("Block Hash: {}", hash));
        }
        _ => lines.push("Pending: true".to_string()),
    }
    lines.push(input_data(&tx.input, input));
    lines
}

async fn receipt(ctx: &Context, hash: &str, abi: Option<&str>) -> Result<(), CliError> {
    let client = ctx.client().await?;
    let abi = match abi {
        Some(name) => Some(get_abi(name).await?),
        None => None,
    };
    let receipt = client
        .get_receipt(&parse_hash(hash)?)
        .await
        .map_err(|e| CliError::context("Failed to get transaction receipt", e))?;
    print_receipt(ctx, receipt, abi.as_ref())
}

/// Print a receipt, decoding its logs when an ABI is known
pub(crate) fn print_receipt(ctx: &Context, mut receipt: Receipt, abi: Option<&Abi>) -> Result<(), CliError> {
    if let Some(abi) = abi {
        match parse_logs(abi, &receipt.logs) {
            Ok(events) => receipt.parsed_logs = Some(events),
            Err(e) => eprintln!("ERROR: Cannot parse the receipt logs: {}\ncontinuing...", e),
        }
    }
    if ctx.json() {
        return print_json(&receipt);
    }
    for line in receipt_lines(&receipt)? {
        println!("{}", line);
    }
    Ok(())
}

fn receipt_lines(r: &Receipt) -> Result<Vec<String>, CliError> {
    let mut lines = vec![
        format!("Transaction receipt address: {}", r.transaction_hash),
        format!("Block: #{} {}", r.block_number, r.block_hash),
        format!("Tx Index: {}", r.transaction_index),
        format!("Tx Hash: {}", r.transaction_hash),
        format!("From: {}", r.from),
    ];
    if let Some(to) = &r.to {
        lines.push(format!("To: {}", to));
    }
    if let Some(address) = r.contract_address.filter(|a| !a.is_zero()) {
        lines.push(format!("Contract Address: {}", address));
    }
    lines.push(format!("Gas Used: {}", r.gas_used));
    lines.push(format!("Cumulative Gas Used: {}", r.cumulative_gas_used));
    let status = match r.status {
        0 => "Failed".to_string(),
        1 => "Successful".to_string(),
        other => format!("{} (unrecognized status)", other),
    };
    lines.push(format!("Status: {}", status));
    lines.push(format!(
        "Post State: 0x{}",
        r.post_state.as_ref().map(hex::encode).unwrap_or_default()
    ));
    lines.push(format!("Bloom: 0x{}", hex::encode(&r.logs_bloom)));
    lines.push(format!("Logs: {}", serde_json::to_string(&r.logs)?));
    if let Some(parsed) = &r.parsed_logs {
        lines.push(format!("Parsed Logs: {}", serde_json::to_string_pretty(parsed)?));
    }
    Ok(lines)
}

fn account_address(ctx: &Context, address: Option<String>) -> Result<web3_sdk::Address, CliError> {
    match address.filter(|a| !a.is_empty()) {
        Some(a) => parse_address(&a),
        None => {
            let key = ctx.settings.private_key.as_deref().ok_or_else(|| {
                CliError::InvalidInput(
                    "Missing address. Must be specified as only argument, or implied from a private key."
                        .to_string(),
                )
            })?;
            Ok(*Wallet::from_private_key(key)?.address())
        }
    }
}

async fn address_details(ctx: &Context, address: Option<String>, only_balance: bool) -> Result<(), CliError> {
    let address = account_address(ctx, address)?;
    let client = ctx.client().await?;
    let balance = client
        .get_balance(&address, BlockId::Latest)
        .await
        .map_err(|e| CliError::context("Cannot get address balance from the network", e))?;
    let code = client
        .get_code(&address, BlockId::Latest)
        .await
        .map_err(|e| CliError::context("Cannot get address code from the network", e))?;
    let code = (!code.is_empty()).then(|| format!("0x{}", hex::encode(&code)));

    if ctx.json() {
        return print_json(&json!({ "balance": balance.to_string(), "code": code }));
    }

    let unit = &ctx.settings.endpoint.unit;
    if only_balance {
        println!("{} {}", wei_as_base(&balance), unit);
    } else {
        println!("Balance: {} {}", wei_as_base(&balance), unit);
        if let Some(code) = code {
            println!("Code: {}", code);
        }
    }
    Ok(())
}

async fn erc20_balance(ctx: &Context, account: Option<String>, contract: &str) -> Result<(), CliError> {
    let address = account_address(ctx, account)?;
    let contract = parse_address(contract)?;
    let client = ctx.client().await?;
    let abi = get_abi("erc20").await?;

    let decimals = tx::call_constant_function(&client, &abi, Some(&contract), "decimals", &[], None).await?;
    let balance = tx::call_constant_function(
        &client,
        &abi,
        Some(&contract),
        "balanceOf",
        &[json!(address.to_hex())],
        None,
    )
    .await?;

    let decimals = first(&decimals).and_then(value_to_u256)?.low_u64() as usize;
    let balance = first(&balance).and_then(value_to_u256)?;
    let formatted = format_units(&balance, decimals);

    Output::new(ctx.json())
        .field("balance", balance)
        .field("formatted", &formatted)
        .field_value("decimals", json!(decimals))
        .line(formatted)
        .print();
    Ok(())
}

fn first(values: &[serde_json::Value]) -> Result<&serde_json::Value, CliError> {
    match values {
        [value] => Ok(value),
        other => Err(CliError::Failed(format!(
            "Expected single result but got: {:?}",
            other
        ))),
    }
}

async fn snapshot(ctx: &Context) -> Result<(), CliError> {
    let client = ctx.client().await?;
    let s = client
        .get_snapshot()
        .await
        .map_err(|e| CliError::context("Cannot get snapshot from the network", e))?;

    if ctx.json() {
        return print_json(&s);
    }

    println!("Latest Number: {}", s.number);
    println!("Latest Hash: {}", s.hash);
    println!("Signers:");
    let mut signers: Vec<_> = s.signers.iter().collect();
    signers.sort_by(|a, b| b.1.cmp(a.1));
    for (addr, num) in signers {
        println!(
            " {} signed block {} - {} blocks ago",
            addr,
            num,
            s.number.saturating_sub(*num)
        );
    }

    println!("Voters:");
    for addr in &s.voters {
        println!(" {}", addr);
    }

    if !s.votes.is_empty() {
        println!("Votes:");
        for vote in &s.votes {
            let pre = if vote.authorize { "" } else { "un" };
            println!(
                "\t{}: signer {} voted to {}authorize {}",
                vote.block, vote.signer, pre, vote.address
            );
        }
        println!("Tally:");
        for (addr, tally) in &s.tally {
            let direction = if tally.authorize { "authorize" } else { "unauthorize" };
            println!(" {} {} {}", addr, direction, tally.votes);
        }
    }
    Ok(())
}

async fn id(ctx: &Context) -> Result<(), CliError> {
    let client = ctx.client().await?;
    let id = client
        .get_id()
        .await
        .map_err(|e| CliError::context("Cannot get id info from the network", e))?;

    Output::new(ctx.json())
        .field_value("network_id", json!(id.network_id))
        .field_value("chain_id", json!(id.chain_id))
        .field("genesis_hash", id.genesis_hash)
        .line(format!("Network ID: {}", id.network_id))
        .line(format!("Chain ID: {}", id.chain_id))
        .line(format!("Genesis Hash: {}", id.genesis_hash))
        .print();
    Ok(())
}

fn my_address(ctx: &Context) -> Result<(), CliError> {
    let wallet = Wallet::from_private_key(ctx.settings.require_private_key()?)?;
    Output::new(ctx.json())
        .field("address", wallet.address())
        .line(wallet.address().to_string())
        .print();
    Ok(())
}
