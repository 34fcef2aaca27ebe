//! Native and ERC20 transfers

use clap::Args;
use serde_json::json;
use web3_sdk::assets::get_abi;
use web3_sdk::units::{parse_amount, parse_big_int, parse_gwei, parse_units};
use web3_sdk::{tx, Address, SentTransaction, TxOptions};

use super::contract::CALL_GAS_LIMIT;
use super::{parse_address, query::print_receipt, value_to_u256, Context};
use crate::output::Output;
use crate::CliError;

/// `web3 transfer 0.1 to 0x...`
#[derive(Debug, Args)]
pub struct TransferCommand {
    /// AMOUNT to ADDRESS
    #[arg(num_args = 0..)]
    args: Vec<String>,
    /// Transfer ERC20 tokens instead of the native coin
    #[arg(long)]
    erc20: bool,
    /// ERC20 contract address
    #[arg(long, env = crate::ADDRESS_VAR)]
    address: Option<String>,
    /// Wait for the receipt
    #[arg(long)]
    wait: bool,
    /// Gas limit
    #[arg(long, default_value_t = tx::TRANSFER_GAS_LIMIT)]
    gas_limit: u64,
    /// Gas price in wei
    #[arg(long, conflicts_with = "gas_price_gwei")]
    gas_price: Option<String>,
    /// Gas price in gwei
    #[arg(long)]
    gas_price_gwei: Option<String>,
}

/// Split `AMOUNT to ADDRESS`
fn parse_transfer_args(args: &[String]) -> Result<(&str, Address), CliError> {
    match args {
        [amount, to, address] if to == "to" => {
            let address = Address::from_hex(address)
                .map_err(|_| CliError::InvalidInput(format!("Invalid to 'address': {}", address)))?;
            Ok((amount, address))
        }
        _ => Err(CliError::InvalidInput(
            "Invalid arguments. Format is: `transfer X to ADDRESS`".to_string(),
        )),
    }
}

impl TransferCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        let (amount, to) = parse_transfer_args(&self.args)?;
        let private_key = ctx.settings.require_private_key()?;

        let gas_price = match (&self.gas_price, &self.gas_price_gwei) {
            (Some(wei), _) => Some(parse_big_int(wei)?),
            (None, Some(gwei)) => Some(parse_gwei(gwei)?),
            (None, None) => None,
        };
        let opts = TxOptions {
            gas_price,
            ..TxOptions::default()
        };

        let client = ctx.client().await?;

        let (sent, abi) = if self.erc20 {
            let contract = self
                .address
                .as_deref()
                .filter(|a| !a.is_empty())
                .ok_or_else(|| CliError::InvalidInput("You must set ERC20 contract address".to_string()))
                .and_then(parse_address)?;
            let abi = get_abi("erc20").await?;

            let decimals =
                tx::call_constant_function(&client, &abi, Some(&contract), "decimals", &[], None)
                    .await
                    .map_err(|e| CliError::context("Cannot get token decimals", e))?;
            let decimals = decimals
                .first()
                .ok_or_else(|| CliError::Failed("Cannot get token decimals".to_string()))
                .and_then(value_to_u256)?;
            let value = parse_units(amount, decimals.low_u64() as usize)?;

            let gas_limit = if self.gas_limit == tx::TRANSFER_GAS_LIMIT {
                CALL_GAS_LIMIT
            } else {
                self.gas_limit
            };
            let sent = tx::call_transact_function(
                &client,
                private_key,
                &abi,
                Some(&contract),
                "transfer",
                &[json!(to.to_hex()), json!(value.to_string())],
                &opts.gas_limit(gas_limit),
            )
            .await
            .map_err(|e| CliError::context("Cannot transfer tokens", e))?;
            (sent, Some(abi))
        } else {
            let value = parse_amount(amount)?;
            let sent = tx::send(&client, private_key, &to, value, &opts.gas_limit(self.gas_limit))
                .await
                .map_err(|e| CliError::context("Cannot create transaction", e))?;
            (sent, None)
        };

        print_sent(ctx, &sent);
        if self.wait {
            let receipt = ctx.wait_for_receipt(&client, &sent.hash).await?;
            print_receipt(ctx, receipt, abi.as_ref())?;
        }
        Ok(())
    }
}

fn print_sent(ctx: &Context, sent: &SentTransaction) {
    let value = if sent.value.is_zero() {
        json!(null)
    } else {
        json!(sent.value.to_string())
    };
    Output::new(ctx.json())
        .field("hash", sent.hash)
        .field("from", sent.from)
        .field_value("to", json!(sent.to.map(|a| a.to_string())))
        .field_value("nonce", json!(sent.nonce))
        .field_value("value", value)
        .field_value("gas_limit", json!(sent.gas_limit))
        .field("gas_price", sent.gas_price)
        .line(format!("Transaction address: {}", sent.hash))
        .print();
}
