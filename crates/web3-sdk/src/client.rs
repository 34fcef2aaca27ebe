//! Client - one method per JSON-RPC call

use bytes::Bytes;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use web3_primitives::{Address, H256, U256};
use web3_types::serde_hex;
use web3_types::{Block, CallMsg, Id, Receipt, Snapshot, Transaction};

use crate::transport::{self, deserialize_response, MockTransport, Transport};
use crate::types::BlockId;
use crate::SdkError;

/// keccak(rlp([])) - `sha3Uncles` of a block without uncles
pub const EMPTY_UNCLE_HASH: H256 = H256::from_bytes([
    0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc, 0xd4, 0x1a,
    0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd, 0x40, 0xd4, 0x93, 0x47,
]);

/// Root of an empty trie - `transactionsRoot` of a block without transactions
pub const EMPTY_ROOT_HASH: H256 = H256::from_bytes([
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
]);

/// Default receipt poll interval
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// RPC client for an Ethereum-compatible node
pub struct Client {
    transport: Box<dyn Transport>,
    chain_id: RwLock<Option<u64>>,
}

impl Client {
    /// Connect to `url`; the transport is chosen by scheme.
    pub async fn dial(url: &str) -> Result<Self, SdkError> {
        Ok(Self {
            transport: transport::connect(url).await?,
            chain_id: RwLock::new(None),
        })
    }

    /// Create a new client with mock transport (for testing)
    pub fn new_mock() -> Self {
        Self {
            transport: Box::new(MockTransport::new()),
            chain_id: RwLock::new(Some(1)),
        }
    }

    /// Create a client with a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            chain_id: RwLock::new(None),
        }
    }

    /// Helper method to make RPC request and deserialize
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        let value = self.transport.request_json(method, params).await?;
        deserialize_response(value)
    }

    /// Like [`request`](Self::request), but `null` becomes [`SdkError::NotFound`].
    async fn request_found<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, SdkError> {
        let value = self.transport.request_json(method, params).await?;
        if value.is_null() {
            debug!(method, "rpc returned null");
            return Err(SdkError::NotFound);
        }
        deserialize_response(value)
    }

    // ==================== Chain Info ====================

    /// Chain id, fetched once with `eth_chainId` and then cached.
    pub async fn chain_id(&self) -> Result<u64, SdkError> {
        if let Some(id) = *self.chain_id.read() {
            return Ok(id);
        }
        let result: String = self.request("eth_chainId", vec![]).await?;
        let id = parse_hex_u64(&result)?;
        *self.chain_id.write() = Some(id);
        Ok(id)
    }

    /// Pin the chain id, skipping `eth_chainId`
    pub fn set_chain_id(&self, chain_id: u64) {
        *self.chain_id.write() = Some(chain_id);
    }

    /// Network id from `net_version` (a decimal string)
    pub async fn network_id(&self) -> Result<u64, SdkError> {
        let version: String = self.request("net_version", vec![]).await?;
        parse_net_version(&version)
    }

    /// Genesis hash, network id and chain id in one batch round trip
    pub async fn get_id(&self) -> Result<Id, SdkError> {
        let mut results = self
            .transport
            .request_batch(vec![
                (
                    "eth_getBlockByNumber".to_string(),
                    vec![Value::from("0x0"), Value::Bool(false)],
                ),
                ("net_version".to_string(), vec![]),
                ("eth_chainId".to_string(), vec![]),
            ])
            .await?
            .into_iter();

        let mut next = |method: &str| -> Value {
            match results.next() {
                Some(Ok(v)) => v,
                Some(Err(e)) => {
                    warn!(method, error = %e, "batch element failed");
                    Value::Null
                }
                None => Value::Null,
            }
        };
        let genesis = next("eth_getBlockByNumber");
        let net_version = next("net_version");
        let chain_id = next("eth_chainId");

        let net_version = net_version.as_str().unwrap_or_default().to_string();
        let network_id = parse_net_version(&net_version)?;
        let chain_id = chain_id.as_str().map(parse_hex_u64).transpose()?.unwrap_or_default();
        let genesis_hash = genesis
            .get("hash")
            .cloned()
            .map(deserialize_response::<H256>)
            .transpose()?
            .unwrap_or(H256::ZERO);

        Ok(Id {
            network_id,
            chain_id,
            genesis_hash,
        })
    }

    /// Current gas price (`eth_gasPrice`)
    pub async fn gas_price(&self) -> Result<U256, SdkError> {
        self.request("eth_gasPrice", vec![]).await
    }

    /// Suggested priority fee (`eth_maxPriorityFeePerGas`)
    pub async fn max_priority_fee(&self) -> Result<U256, SdkError> {
        self.request("eth_maxPriorityFeePerGas", vec![]).await
    }

    /// Get the current block number
    pub async fn block_number(&self) -> Result<u64, SdkError> {
        let result: String = self.request("eth_blockNumber", vec![]).await?;
        parse_hex_u64(&result)
    }

    /// Clique signer snapshot at the latest block
    pub async fn get_snapshot(&self) -> Result<Snapshot, SdkError> {
        self.request("clique_getSnapshot", vec![Value::from("latest")])
            .await
    }

    // ==================== Account Queries ====================

    /// Get the balance of an address
    pub async fn get_balance(&self, address: &Address, block: BlockId) -> Result<U256, SdkError> {
        self.request(
            "eth_getBalance",
            vec![Value::String(address.to_hex()), serde_json::to_value(block)?],
        )
        .await
    }

    /// Nonce to use for the next transaction (pending count)
    pub async fn get_pending_nonce(&self, address: &Address) -> Result<u64, SdkError> {
        self.get_nonce(address, BlockId::Pending).await
    }

    /// Get the nonce (transaction count) of an address
    pub async fn get_nonce(&self, address: &Address, block: BlockId) -> Result<u64, SdkError> {
        let result: String = self
            .request(
                "eth_getTransactionCount",
                vec![Value::String(address.to_hex()), serde_json::to_value(block)?],
            )
            .await?;
        parse_hex_u64(&result)
    }

    /// Get the code at an address
    pub async fn get_code(&self, address: &Address, block: BlockId) -> Result<Bytes, SdkError> {
        let result: String = self
            .request(
                "eth_getCode",
                vec![Value::String(address.to_hex()), serde_json::to_value(block)?],
            )
            .await?;
        parse_hex_bytes(&result)
    }

    // ==================== Block Queries ====================

    /// Get a block by number
    pub async fn get_block_by_number(
        &self,
        block: BlockId,
        include_txs: bool,
    ) -> Result<Block, SdkError> {
        self.get_block(
            "eth_getBlockByNumber",
            serde_json::to_value(block)?,
            include_txs,
        )
        .await
    }

    /// Get a block by hash
    pub async fn get_block_by_hash(&self, hash: &H256, include_txs: bool) -> Result<Block, SdkError> {
        self.get_block("eth_getBlockByHash", Value::String(hash.to_hex()), include_txs)
            .await
    }

    async fn get_block(
        &self,
        method: &str,
        id: Value,
        include_txs: bool,
    ) -> Result<Block, SdkError> {
        let block: Block = self
            .request_found(method, vec![id, Value::Bool(include_txs)])
            .await?;
        check_block(&block)?;

        // Uncle headers are not part of the block response
        if !block.uncles.is_empty() {
            let calls = (0..block.uncles.len())
                .map(|i| {
                    (
                        "eth_getUncleByBlockHashAndIndex".to_string(),
                        vec![Value::String(block.hash.to_hex()), Value::String(format!("{i:#x}"))],
                    )
                })
                .collect();
            let uncles = self.transport.request_batch(calls).await?;
            for (i, uncle) in uncles.into_iter().enumerate() {
                if uncle?.is_null() {
                    return Err(SdkError::Rpc {
                        code: 0,
                        message: format!(
                            "got null header for uncle {i} of block {}",
                            block.hash.to_hex()
                        ),
                    });
                }
            }
        }
        Ok(block)
    }

    // ==================== Transaction Queries ====================

    /// Get a transaction by hash
    pub async fn get_transaction(&self, hash: &H256) -> Result<Transaction, SdkError> {
        let tx: Transaction = self
            .request_found("eth_getTransactionByHash", vec![Value::String(hash.to_hex())])
            .await?;
        if !tx.has_signature() {
            return Err(SdkError::Rpc {
                code: 0,
                message: "server returned transaction without signature".to_string(),
            });
        }
        Ok(tx)
    }

    /// Get a transaction receipt
    pub async fn get_receipt(&self, hash: &H256) -> Result<Receipt, SdkError> {
        self.request_found(
            "eth_getTransactionReceipt",
            vec![Value::String(hash.to_hex())],
        )
        .await
    }

    /// Poll for a receipt every [`RECEIPT_POLL_INTERVAL`] until it exists.
    ///
    /// `NotFound` is retried; any other error ends the loop. Returns
    /// [`SdkError::Cancelled`] if `cancel` fires first.
    pub async fn wait_for_receipt(
        &self,
        hash: &H256,
        cancel: &CancellationToken,
    ) -> Result<Receipt, SdkError> {
        self.wait_for_receipt_every(hash, cancel, RECEIPT_POLL_INTERVAL)
            .await
    }

    /// [`wait_for_receipt`](Self::wait_for_receipt) with a custom interval
    pub async fn wait_for_receipt_every(
        &self,
        hash: &H256,
        cancel: &CancellationToken,
        interval: Duration,
    ) -> Result<Receipt, SdkError> {
        loop {
            if cancel.is_cancelled() {
                return Err(SdkError::Cancelled);
            }
            match self.get_receipt(hash).await {
                Ok(receipt) => return Ok(receipt),
                Err(SdkError::NotFound) => {
                    warn!(hash = %hash, "receipt not found, retrying");
                }
                Err(e) => return Err(e),
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(SdkError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    // ==================== Transaction Submission ====================

    /// Send a raw transaction (RLP-encoded bytes)
    pub async fn send_raw_transaction(&self, tx: &[u8]) -> Result<H256, SdkError> {
        let hex = format!("0x{}", hex::encode(tx));
        let result: String = self
            .request("eth_sendRawTransaction", vec![Value::String(hex)])
            .await?;
        Ok(H256::from_hex(&result)?)
    }

    // ==================== Call & Estimation ====================

    /// Execute a call against the latest block (read-only)
    pub async fn call(&self, msg: &CallMsg) -> Result<Bytes, SdkError> {
        let result: String = self
            .request(
                "eth_call",
                vec![serde_json::to_value(msg)?, serde_json::to_value(BlockId::Latest)?],
            )
            .await?;
        parse_hex_bytes(&result)
    }

    /// Estimate gas for a transaction
    pub async fn estimate_gas(&self, msg: &CallMsg) -> Result<u64, SdkError> {
        let result: String = self
            .request("eth_estimateGas", vec![serde_json::to_value(msg)?])
            .await?;
        parse_hex_u64(&result)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("chain_id", &*self.chain_id.read())
            .finish_non_exhaustive()
    }
}

// ==================== Helper Functions ====================

/// Header/body consistency checks on a block response
fn check_block(block: &Block) -> Result<(), SdkError> {
    let fail = |message: &str| {
        Err(SdkError::Rpc {
            code: 0,
            message: message.to_string(),
        })
    };
    if block.sha3_uncles == EMPTY_UNCLE_HASH && !block.uncles.is_empty() {
        return fail("server returned non-empty uncle list but block header indicates no uncles");
    }
    if block.sha3_uncles != EMPTY_UNCLE_HASH && block.uncles.is_empty() {
        return fail("server returned empty uncle list but block header indicates uncles");
    }
    if block.transactions_root == EMPTY_ROOT_HASH && block.tx_count() > 0 {
        return fail(
            "server returned non-empty transaction list but block header indicates no transactions",
        );
    }
    Ok(())
}

fn parse_net_version(version: &str) -> Result<u64, SdkError> {
    version
        .parse()
        .map_err(|_| SdkError::Convert(format!("invalid net_version result {version:?}")))
}

fn parse_hex_u64(s: &str) -> Result<u64, SdkError> {
    let s = web3_primitives::strip_0x(s);
    u64::from_str_radix(s, 16).map_err(|e| SdkError::InvalidHex(e.to_string()))
}

fn parse_hex_bytes(s: &str) -> Result<Bytes, SdkError> {
    Ok(serde_hex::bytes::decode(s)?)
}
