//! JSON-RPC views of blocks, transactions, receipts and logs.
//!
//! Required fields are non-optional, so a node response missing one fails to
//! deserialize with serde's `missing field` error.

use crate::serde_hex;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use web3_primitives::{Address, H256, U256};

/// Receipt status of a failed transaction
pub const RECEIPT_STATUS_FAILED: u64 = 0;

/// Receipt status of a successful transaction
pub const RECEIPT_STATUS_SUCCESSFUL: u64 = 1;

/// Block as returned by `eth_getBlockByNumber` / `eth_getBlockByHash`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Parent block hash
    pub parent_hash: H256,
    /// Hash of the uncle list
    pub sha3_uncles: H256,
    /// Coinbase
    pub miner: Address,
    /// Authorized signers (clique extension)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signers: Vec<Address>,
    /// Authorized voters (clique extension)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub voters: Vec<Address>,
    /// Block signer signature (clique extension)
    #[serde(default, with = "serde_hex::opt_bytes", skip_serializing_if = "Option::is_none")]
    pub signer: Option<Bytes>,
    /// State root
    pub state_root: H256,
    /// Transactions root
    pub transactions_root: H256,
    /// Receipts root
    pub receipts_root: H256,
    /// Logs bloom
    #[serde(with = "serde_hex::bytes")]
    pub logs_bloom: Bytes,
    /// Difficulty
    pub difficulty: U256,
    /// Total difficulty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_difficulty: Option<U256>,
    /// Block number
    #[serde(with = "serde_hex::quantity")]
    pub number: u64,
    /// Gas limit
    #[serde(with = "serde_hex::quantity")]
    pub gas_limit: u64,
    /// Gas used
    #[serde(with = "serde_hex::quantity")]
    pub gas_used: u64,
    /// Unix timestamp in seconds
    #[serde(with = "serde_hex::quantity")]
    pub timestamp: u64,
    /// Extra data
    #[serde(with = "serde_hex::bytes")]
    pub extra_data: Bytes,
    /// Mix hash
    pub mix_hash: H256,
    /// PoW nonce (8 bytes)
    #[serde(with = "serde_hex::bytes")]
    pub nonce: Bytes,
    /// Base fee (EIP-1559 blocks only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    /// Block hash
    pub hash: H256,
    /// Transaction hashes or full transactions
    #[serde(default)]
    pub transactions: BlockTransactions,
    /// Uncle hashes
    #[serde(default)]
    pub uncles: Vec<H256>,
}

impl Block {
    /// Block time in UTC
    pub fn time(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp as i64, 0)
            .single()
            .unwrap_or_default()
    }

    /// Printable prefix of the extra data (at most 32 bytes).
    pub fn extra_vanity(&self) -> String {
        let end = self.extra_data.len().min(32);
        String::from_utf8_lossy(&self.extra_data[..end]).into_owned()
    }

    /// Number of transactions regardless of representation
    pub fn tx_count(&self) -> usize {
        match &self.transactions {
            BlockTransactions::Hashes(h) => h.len(),
            BlockTransactions::Full(t) => t.len(),
        }
    }
}

/// Block body transactions: hashes when `fullTx` is false, objects otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Transaction hashes
    Hashes(Vec<H256>),
    /// Full transaction objects
    Full(Vec<Transaction>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

/// Transaction as returned by `eth_getTransactionByHash`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Sender nonce
    #[serde(with = "serde_hex::quantity")]
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: U256,
    /// Gas limit
    #[serde(rename = "gas", with = "serde_hex::quantity")]
    pub gas_limit: u64,
    /// Recipient; `None` for contract creation
    #[serde(default)]
    pub to: Option<Address>,
    /// Value in wei
    pub value: U256,
    /// Call data
    #[serde(default, with = "serde_hex::bytes")]
    pub input: Bytes,
    /// Sender
    #[serde(default)]
    pub from: Address,
    /// Signature V
    #[serde(default)]
    pub v: Option<U256>,
    /// Signature R
    #[serde(default)]
    pub r: Option<U256>,
    /// Signature S
    #[serde(default)]
    pub s: Option<U256>,
    /// Transaction hash
    #[serde(default)]
    pub hash: H256,
    /// Containing block number; `None` while pending
    #[serde(default, with = "serde_hex::opt_quantity", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Containing block hash; `None` while pending
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<H256>,
    /// Index within the block
    #[serde(default, with = "serde_hex::opt_quantity", skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
}

impl Transaction {
    /// Whether the node returned signature values
    pub fn has_signature(&self) -> bool {
        self.r.is_some() && self.s.is_some() && self.v.is_some()
    }
}

/// Log entry emitted by a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics; topics[0] is the event signature hash
    pub topics: Vec<H256>,
    /// Non-indexed data
    #[serde(default, with = "serde_hex::bytes")]
    pub data: Bytes,
    /// Block number
    #[serde(default, with = "serde_hex::opt_quantity", skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Transaction hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<H256>,
    /// Transaction index
    #[serde(default, with = "serde_hex::opt_quantity", skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    /// Block hash
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<H256>,
    /// Log index in the block
    #[serde(default, with = "serde_hex::opt_quantity", skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    /// Removed by a reorg
    #[serde(default)]
    pub removed: bool,
}

/// One decoded event field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventField {
    /// ABI input name
    pub name: String,
    /// Decoded value
    pub value: Value,
}

/// A log decoded against an ABI event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name
    pub name: String,
    /// Fields in ABI input order
    pub fields: Vec<EventField>,
}

impl Event {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Receipt as returned by `eth_getTransactionReceipt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Post-state root (pre-Byzantium)
    #[serde(
        rename = "root",
        default,
        with = "serde_hex::opt_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_state: Option<Bytes>,
    /// 1 on success, 0 on failure
    #[serde(default, with = "serde_hex::quantity")]
    pub status: u64,
    /// Cumulative gas used in the block
    #[serde(with = "serde_hex::quantity")]
    pub cumulative_gas_used: u64,
    /// Logs bloom
    #[serde(default, with = "serde_hex::bytes")]
    pub logs_bloom: Bytes,
    /// Emitted logs
    pub logs: Vec<Log>,
    /// Transaction hash
    pub transaction_hash: H256,
    /// Transaction index
    #[serde(with = "serde_hex::quantity")]
    pub transaction_index: u64,
    /// Created contract, if any
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// Gas used by this transaction
    #[serde(with = "serde_hex::quantity")]
    pub gas_used: u64,
    /// Block hash
    pub block_hash: H256,
    /// Block number
    #[serde(with = "serde_hex::quantity")]
    pub block_number: u64,
    /// Sender
    pub from: Address,
    /// Recipient
    #[serde(default)]
    pub to: Option<Address>,
    /// Logs decoded against an ABI, filled in by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_logs: Option<Vec<Event>>,
}

impl Receipt {
    /// Whether the transaction succeeded
    pub fn is_success(&self) -> bool {
        self.status == RECEIPT_STATUS_SUCCESSFUL
    }
}
