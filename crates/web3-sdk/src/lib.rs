//! # web3-sdk
//!
//! Client library for Ethereum-compatible JSON-RPC nodes.
//!
//! ## Features
//!
//! - **Client**: one method per JSON-RPC call, over HTTP or WebSocket
//! - **Wallet** / **TxBuilder**: key handling and legacy/EIP-1559 signing
//! - **tx**: transfers, deployments and contract calls with JSON arguments
//! - **abi**: ABI parsing, encoding, argument conversion and log decoding
//! - **did** / **vc** / **registry**: decentralized identifiers and credentials
//! - **solc** / **vyper** / **generate**: contract compilation and generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use web3_sdk::{tx, units, Address, Client, TxOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::dial("https://rpc.gochain.io").await?;
//!     println!("block {}", client.block_number().await?);
//!
//!     let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d")?;
//!     let sent = tx::send(
//!         &client,
//!         "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
//!         &to,
//!         units::parse_amount("1.5go")?,
//!         &TxOptions::default(),
//!     )
//!     .await?;
//!     println!("sent {}", sent.hash);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod abi;
pub mod assets;
mod client;
pub mod did;
mod error;
pub mod generate;
pub mod networks;
pub mod registry;
pub mod solc;
mod transport;
pub mod tx;
mod tx_builder;
pub mod types;
pub mod units;
pub mod vc;
pub mod vyper;
mod wallet;

// Re-export main types
pub use client::{Client, EMPTY_ROOT_HASH, EMPTY_UNCLE_HASH, RECEIPT_POLL_INTERVAL};
pub use error::SdkError;
pub use transport::{connect, HttpTransport, MockTransport};

/// Re-export Transport trait for custom implementations
pub use transport::Transport;
pub use tx::TxOptions;
pub use tx_builder::TxBuilder;
pub use types::{BlockId, SentTransaction};
pub use wallet::{hash_message, Wallet};

#[cfg(feature = "ws")]
pub use transport::WsTransport;

// Re-export primitives for convenience
pub use tokio_util::sync::CancellationToken;
pub use web3_primitives::{is_hex_address, Address, H256, U256};
pub use web3_types::{
    Block, BlockTransactions, CallMsg, Event, EventField, Id, Log, Receipt, SignedTransaction,
    Snapshot, Transaction,
};
