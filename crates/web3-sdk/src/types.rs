//! SDK types

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use web3_primitives::{Address, H256, U256};

use crate::SdkError;

/// Block identifier for RPC queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockId {
    /// Block number
    Number(u64),
    /// Latest block
    #[default]
    Latest,
    /// Pending block (includes pending transactions)
    Pending,
    /// Earliest block (genesis)
    Earliest,
}

impl Serialize for BlockId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Number(n) => write!(f, "{n:#x}"),
            BlockId::Latest => f.write_str("latest"),
            BlockId::Pending => f.write_str("pending"),
            BlockId::Earliest => f.write_str("earliest"),
        }
    }
}

impl From<u64> for BlockId {
    fn from(n: u64) -> Self {
        BlockId::Number(n)
    }
}

/// Accepts a tag, a decimal number, or a `0x` quantity.
impl FromStr for BlockId {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "latest" => Ok(BlockId::Latest),
            "pending" => Ok(BlockId::Pending),
            "earliest" => Ok(BlockId::Earliest),
            _ => {
                let n = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => s.parse(),
                };
                n.map(BlockId::Number)
                    .map_err(|_| SdkError::Convert(format!("invalid block number {s:?}")))
            }
        }
    }
}

/// A transaction as submitted by this client, before it is mined
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentTransaction {
    /// Transaction hash
    pub hash: H256,
    /// Sender
    pub from: Address,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    /// Nonce used
    pub nonce: u64,
    /// Gas price in wei (or fee cap for dynamic fee transactions)
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Value in wei
    pub value: U256,
}
