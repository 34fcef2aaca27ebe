//! Transfers, contract deployment and contract calls
//!
//! Each operation resolves whatever the caller left unset (chain id, nonce,
//! gas price, gas limit), signs with the given key and submits the raw
//! transaction. None of them wait for the receipt; use
//! [`Client::wait_for_receipt`] for that.

use bytes::Bytes;
use serde_json::Value;
use tracing::{debug, info};
use web3_primitives::{Address, U256};
use web3_types::CallMsg;

use crate::abi::{convert_arguments, convert_outputs, Abi};
use crate::types::SentTransaction;
use crate::{Client, SdkError, TxBuilder, Wallet};

/// Gas limit used for plain transfers when none is given
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Caller overrides for gas and value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOptions {
    /// Gas price in wei; `None` or zero asks the node
    pub gas_price: Option<U256>,
    /// Gas limit; zero means 21000 for transfers and an estimate otherwise
    pub gas_limit: u64,
    /// Value sent with the transaction, in wei
    pub value: U256,
    /// Send an EIP-1559 transaction instead of a legacy one
    pub dynamic_fee: bool,
    /// Priority fee for EIP-1559; `None` asks the node
    pub priority_fee: Option<U256>,
}

impl TxOptions {
    /// Set the gas price
    pub fn gas_price(mut self, price: U256) -> Self {
        self.gas_price = Some(price);
        self
    }

    /// Set the gas limit
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = limit;
        self
    }

    /// Set the value
    pub fn value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Transfer `amount` wei to `to`
pub async fn send(
    client: &Client,
    private_key: &str,
    to: &Address,
    amount: U256,
    opts: &TxOptions,
) -> Result<SentTransaction, SdkError> {
    let wallet = Wallet::from_private_key(private_key)?;
    let opts = TxOptions {
        value: amount,
        gas_limit: if opts.gas_limit == 0 {
            TRANSFER_GAS_LIMIT
        } else {
            opts.gas_limit
        },
        ..opts.clone()
    };
    sign_and_send(client, &wallet, Some(*to), Bytes::new(), &opts).await
}

/// Deploy contract bytecode, appending packed constructor arguments
///
/// `abi` is only needed when `args` is non-empty.
pub async fn deploy_contract(
    client: &Client,
    private_key: &str,
    bin_hex: &str,
    abi: Option<&Abi>,
    args: &[Value],
    opts: &TxOptions,
) -> Result<SentTransaction, SdkError> {
    let wallet = Wallet::from_private_key(private_key)?;
    let mut code = decode_bytecode(bin_hex)?;

    if !args.is_empty() {
        let abi = abi.ok_or_else(|| {
            SdkError::TxBuild("constructor arguments given without an ABI".to_string())
        })?;
        let tokens = convert_arguments(abi.constructor_inputs(), args)?;
        let packed = abi
            .encode_constructor(&tokens)
            .map_err(|e| SdkError::TxBuild(format!("cannot pack parameters: {}", e)))?;
        code.extend(packed);
    }

    let sent = sign_and_send(client, &wallet, None, Bytes::from(code), opts).await?;
    info!(hash = %sent.hash, from = %sent.from, "contract deployment submitted");
    Ok(sent)
}

/// Call a state-changing contract function in a signed transaction
pub async fn call_transact_function(
    client: &Client,
    private_key: &str,
    abi: &Abi,
    address: Option<&Address>,
    function: &str,
    args: &[Value],
    opts: &TxOptions,
) -> Result<SentTransaction, SdkError> {
    let address = address.ok_or_else(no_address)?;
    let wallet = Wallet::from_private_key(private_key)?;
    let data = encode_function(abi, function, args)?;
    sign_and_send(client, &wallet, Some(*address), Bytes::from(data), opts).await
}

/// Call a contract function with `eth_call` and convert its outputs
pub async fn call_constant_function(
    client: &Client,
    abi: &Abi,
    address: Option<&Address>,
    function: &str,
    args: &[Value],
    from: Option<Address>,
) -> Result<Vec<Value>, SdkError> {
    let address = address.ok_or_else(no_address)?;
    let data = encode_function(abi, function, args)?;
    let mut msg = CallMsg::new(*address, data);
    msg.from = from;

    let output = client.call(&msg).await?;
    let method = abi
        .function(function)
        .ok_or_else(|| SdkError::AbiEncode(format!("method '{}' not found", function)))?;
    if method.outputs.is_empty() {
        return Ok(Vec::new());
    }

    let unpack_error = |e: SdkError| {
        let detail = match e {
            SdkError::AbiDecode(msg) | SdkError::Convert(msg) => msg,
            other => other.to_string(),
        };
        SdkError::AbiDecode(format!("from 0x{}: {}", hex::encode(&output), detail))
    };
    let tokens = abi.decode_output(function, &output).map_err(unpack_error)?;
    convert_outputs(&method.output_types(), &tokens).map_err(unpack_error)
}

fn encode_function(abi: &Abi, function: &str, args: &[Value]) -> Result<Vec<u8>, SdkError> {
    let method = abi
        .function(function)
        .ok_or_else(|| SdkError::AbiEncode(format!("method '{}' not found", function)))?;
    let tokens = convert_arguments(&method.inputs, args)?;
    method.encode_input(&tokens)
}

fn decode_bytecode(bin_hex: &str) -> Result<Vec<u8>, SdkError> {
    let trimmed = bin_hex.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    match hex::decode(hex_part) {
        Ok(code) if !code.is_empty() => Ok(code),
        Ok(_) => Err(SdkError::TxBuild("cannot decode contract data: empty bytecode".to_string())),
        Err(e) => Err(SdkError::TxBuild(format!("cannot decode contract data: {}", e))),
    }
}

fn no_address() -> SdkError {
    SdkError::TxBuild("no contract address specified".to_string())
}

/// Fill in chain id, nonce, gas price and gas limit, then sign and submit.
async fn sign_and_send(
    client: &Client,
    wallet: &Wallet,
    to: Option<Address>,
    data: Bytes,
    opts: &TxOptions,
) -> Result<SentTransaction, SdkError> {
    let from = *wallet.address();

    let gas_price = match opts.gas_price {
        Some(price) if !price.is_zero() => price,
        _ => client
            .gas_price()
            .await
            .map_err(|e| SdkError::TxBuild(format!("cannot get gas price: {}", e)))?,
    };
    let chain_id = client
        .chain_id()
        .await
        .map_err(|e| SdkError::TxBuild(format!("couldn't get chain ID: {}", e)))?;
    let nonce = client
        .get_pending_nonce(&from)
        .await
        .map_err(|e| SdkError::TxBuild(format!("cannot get nonce: {}", e)))?;

    let gas_limit = if opts.gas_limit != 0 {
        opts.gas_limit
    } else {
        let msg = CallMsg {
            from: Some(from),
            to,
            data: data.clone(),
            value: (!opts.value.is_zero()).then_some(opts.value),
            ..Default::default()
        };
        client
            .estimate_gas(&msg)
            .await
            .map_err(|e| SdkError::TxBuild(format!("cannot estimate gas: {}", e)))?
    };

    let mut builder = TxBuilder::new(chain_id)
        .nonce(nonce)
        .gas_limit(gas_limit)
        .value(opts.value)
        .data(data);
    if let Some(to) = to {
        builder = builder.to(to);
    }
    builder = if opts.dynamic_fee {
        let tip = match opts.priority_fee {
            Some(tip) => tip,
            None => client
                .max_priority_fee()
                .await
                .map_err(|e| SdkError::TxBuild(format!("cannot get priority fee: {}", e)))?,
        };
        builder
            .max_priority_fee_per_gas(tip)
            .max_fee_per_gas(gas_price.saturating_add(tip))
    } else {
        builder.gas_price(gas_price)
    };

    let signed = builder.sign(wallet).map_err(|e| match e {
        e @ SdkError::SigningFailed(_) => e,
        other => SdkError::SigningFailed(other.to_string()),
    })?;
    debug!(nonce, gas_limit, chain_id, "signed transaction");

    let hash = client
        .send_raw_transaction(&signed.encode())
        .await
        .map_err(|e| SdkError::TxBuild(format!("failed to send transaction: {}", e)))?;
    info!(hash = %hash, from = %from, nonce, "transaction submitted");

    Ok(SentTransaction {
        hash,
        from,
        to,
        nonce,
        gas_price,
        gas_limit,
        value: opts.value,
    })
}
