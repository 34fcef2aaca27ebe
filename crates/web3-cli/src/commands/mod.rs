//! Command implementations

use std::time::Duration;

use serde_json::Value;
use web3_sdk::registry::IpfsClient;
use web3_sdk::{Address, CancellationToken, Client, Receipt, H256, U256};

use crate::{config::Settings, CliError};

pub mod account;
pub mod claim;
pub mod contract;
pub mod did;
pub mod env;
pub mod generate;
pub mod query;
pub mod transfer;

/// How long commands wait for a receipt before giving up
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// State shared by every command
pub struct Context {
    /// Resolved flags and config
    pub settings: Settings,
    /// Fired on SIGINT
    pub cancel: CancellationToken,
}

impl Context {
    pub fn new(settings: Settings, cancel: CancellationToken) -> Self {
        Self { settings, cancel }
    }

    pub fn json(&self) -> bool {
        self.settings.json()
    }

    /// Connect to the configured endpoint
    pub async fn client(&self) -> Result<Client, CliError> {
        let url = &self.settings.endpoint.url;
        Client::dial(url)
            .await
            .map_err(|e| CliError::context(&format!("Failed to connect to {:?}", url), e))
    }

    pub fn ipfs(&self) -> IpfsClient {
        IpfsClient::new(&self.settings.ipfs_url)
    }

    /// Registry address from the flag, falling back to the config file
    pub fn registry(&self, flag: Option<&str>) -> Result<Option<Address>, CliError> {
        flag.or(self.settings.did_registry.as_deref())
            .filter(|s| !s.is_empty())
            .map(parse_address)
            .transpose()
    }

    /// Wait for a receipt, bounded by [`RECEIPT_TIMEOUT`] and SIGINT
    pub async fn wait_for_receipt(&self, client: &Client, hash: &H256) -> Result<Receipt, CliError> {
        match tokio::time::timeout(RECEIPT_TIMEOUT, client.wait_for_receipt(hash, &self.cancel)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CliError::Failed(format!(
                "timed out after {}s waiting for receipt of {}",
                RECEIPT_TIMEOUT.as_secs(),
                hash
            ))),
        }
    }
}

pub(crate) fn parse_address(s: &str) -> Result<Address, CliError> {
    Address::from_hex(s).map_err(|_| CliError::InvalidAddress(s.to_string()))
}

pub(crate) fn parse_hash(s: &str) -> Result<H256, CliError> {
    H256::from_hex(s).map_err(|e| CliError::InvalidHex(format!("{}: {}", s, e)))
}

/// Numeric ABI output as U256; wide integers arrive as decimal strings
pub(crate) fn value_to_u256(value: &Value) -> Result<U256, CliError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| CliError::InvalidAmount(n.to_string())),
        Value::String(s) => {
            U256::from_dec_str(s).map_err(|_| CliError::InvalidAmount(s.clone()))
        }
        other => Err(CliError::InvalidAmount(other.to_string())),
    }
}
