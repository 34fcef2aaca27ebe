//! # web3-types
//!
//! Types exchanged with an Ethereum-compatible node.
//!
//! - [`Block`], [`Transaction`], [`Receipt`], [`Log`]: JSON-RPC views
//! - [`Snapshot`], [`Id`]: clique snapshot and network identity
//! - [`CallMsg`]: `eth_call` / `eth_estimateGas` argument
//! - [`LegacyTx`], [`DynamicFeeTx`], [`SignedTransaction`]: signable transactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call;
pub mod chain;
mod error;
pub mod rpc;
pub mod serde_hex;
pub mod transaction;

pub use call::CallMsg;
pub use chain::{Id, Snapshot, Tally, Vote};
pub use error::TypeError;
pub use rpc::{
    Block, BlockTransactions, Event, EventField, Log, Receipt, Transaction,
    RECEIPT_STATUS_FAILED, RECEIPT_STATUS_SUCCESSFUL,
};
pub use transaction::{
    DynamicFeeTx, LegacyTx, SignedTransaction, TransactionBody, TxSignature, TxType,
};

pub use web3_primitives::{Address, H256, U256};
