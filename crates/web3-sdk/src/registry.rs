//! DID registry contract and IPFS document storage
//!
//! The registry maps a 32-byte DID id to its owner and to the IPFS hash of
//! the DID document. Documents themselves live on IPFS.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use web3_primitives::{Address, H256};
use web3_types::Receipt;

use crate::abi::Abi;
use crate::assets::DID_REGISTRY_ABI;
use crate::did::{Did, Document, PublicKey, SECP256K1_KEY_TYPE};
use crate::tx::{call_constant_function, call_transact_function, TxOptions};
use crate::{Client, SdkError, Wallet};

/// Longest DID id the registry can hold
pub const MAX_DID_ID_LENGTH: usize = 32;

/// Gas limit of a `register` transaction
pub const REGISTER_GAS_LIMIT: u64 = 70_000;

/// Default IPFS HTTP API endpoint
pub const DEFAULT_IPFS_URL: &str = "https://ipfs.infura.io:5001";

/// Minimal client for the IPFS HTTP API
#[derive(Debug, Clone)]
pub struct IpfsClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddResponse {
    hash: String,
}

impl IpfsClient {
    /// Client for the API at `base_url`, e.g. `http://localhost:5001`
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload and pin a file, returning its content hash
    pub async fn add(&self, name: &str, data: Vec<u8>) -> Result<String, SdkError> {
        let part = reqwest::multipart::Part::bytes(data).file_name(name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(format!("{}/api/v0/add?pin=true", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SdkError::Transport(format!("Unable to upload to IPFS: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SdkError::Transport(format!(
                "Unable to upload to IPFS: {} {}",
                status.as_u16(),
                body
            )));
        }
        let added: AddResponse = resp.json().await?;
        debug!(name, hash = %added.hash, "uploaded to IPFS");
        Ok(added.hash)
    }

    /// Fetch a file by content hash
    pub async fn cat(&self, hash: &str) -> Result<Vec<u8>, SdkError> {
        let resp = self
            .http
            .post(format!("{}/api/v0/cat", self.base_url))
            .query(&[("arg", hash)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| {
                SdkError::Transport(format!("Unable to fetch DID document from IPFS: {}", e))
            })?;
        let body = resp.bytes().await.map_err(|e| {
            SdkError::Transport(format!("Unable to fetch DID document from IPFS: {}", e))
        })?;
        Ok(body.to_vec())
    }
}

impl Default for IpfsClient {
    fn default() -> Self {
        Self::new(DEFAULT_IPFS_URL)
    }
}

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    /// The registered DID
    pub did: Did,
    /// IPFS hash of the uploaded document
    pub ipfs_hash: String,
    /// Receipt of the `register` transaction
    pub receipt: Receipt,
}

/// Document listing `wallet` as the owner key of `did`
pub fn new_did_document(did: &Did, wallet: &Wallet) -> Document {
    let key_id = did.with_fragment("owner").to_string();
    let now = Utc::now();

    let mut doc = Document::new();
    doc.id = did.to_string();
    doc.created = Some(now);
    doc.updated = Some(now);
    doc.public_keys.push(PublicKey {
        id: key_id.clone(),
        kind: SECP256K1_KEY_TYPE.to_string(),
        controller: did.to_string(),
        public_key_hex: wallet.public_key_hex(),
        ..Default::default()
    });
    doc.authentications.push(Value::String(key_id));
    doc
}

/// Create a `go` DID document, upload it to IPFS and register its hash.
///
/// Waits for the receipt until `cancel` fires.
pub async fn create_did(
    client: &Client,
    ipfs: &IpfsClient,
    private_key: &str,
    id: &str,
    registry: Option<&Address>,
    cancel: &CancellationToken,
) -> Result<Registration, SdkError> {
    let registry = require_registry(registry)?;
    if id.is_empty() {
        return Err(SdkError::Did("DID required".to_string()));
    }
    let did = Did::parse(id).map_err(|e| SdkError::Did(format!("Invalid DID: {}", e)))?;
    if did.method != "go" {
        return Err(SdkError::Did("Only 'go' DID methods can be registered.".to_string()));
    }
    if did.id.len() > MAX_DID_ID_LENGTH {
        return Err(SdkError::Did(format!(
            "ID must be at most {} characters",
            MAX_DID_ID_LENGTH
        )));
    }
    let wallet = Wallet::from_private_key(private_key)?;

    let doc = new_did_document(&did, &wallet);
    let ipfs_hash = ipfs.add("did.json", doc.to_pretty_json()?.into_bytes()).await?;

    let abi = registry_abi()?;
    let opts = TxOptions::default().gas_limit(REGISTER_GAS_LIMIT);
    let args = [id_argument(&did), Value::String(ipfs_hash.clone())];
    let sent = call_transact_function(
        client,
        private_key,
        &abi,
        Some(registry),
        "register",
        &args,
        &opts,
    )
    .await
    .map_err(|e| SdkError::Did(format!("Cannot register DID identifier: {}", e)))?;

    let receipt = client.wait_for_receipt(&sent.hash, cancel).await.map_err(|e| {
        SdkError::Did(format!(
            "Cannot get the receipt for transaction with hash '{}': {}",
            sent.hash, e
        ))
    })?;
    if !receipt.is_success() {
        return Err(SdkError::Did(format!("DID contract call failed: {}", sent.hash)));
    }

    info!(did = %did, ipfs_hash = %ipfs_hash, tx = %sent.hash, "registered DID");
    Ok(Registration {
        did,
        ipfs_hash,
        receipt,
    })
}

/// Registered owner of a DID
pub async fn did_owner(
    client: &Client,
    registry: Option<&Address>,
    id: &str,
) -> Result<Address, SdkError> {
    let result = call_registry(client, registry, "owner", id).await?;
    result
        .as_str()
        .and_then(|s| Address::from_hex(s).ok())
        .ok_or_else(|| SdkError::Did(format!("Expected single result but got: {}", result)))
}

/// IPFS hash of a DID's document
pub async fn did_hash(
    client: &Client,
    registry: Option<&Address>,
    id: &str,
) -> Result<String, SdkError> {
    let result = call_registry(client, registry, "hash", id).await?;
    result
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SdkError::Did(format!("Expected single result but got: {}", result)))
}

/// Current DID document, resolved through the registry and IPFS
pub async fn did_document(
    client: &Client,
    ipfs: &IpfsClient,
    registry: Option<&Address>,
    id: &str,
) -> Result<Document, SdkError> {
    let hash = did_hash(client, registry, id).await?;
    let data = ipfs.cat(&hash).await?;
    serde_json::from_slice(&data)
        .map_err(|e| SdkError::Did(format!("Unable to decode DID document: {}", e)))
}

async fn call_registry(
    client: &Client,
    registry: Option<&Address>,
    method: &str,
    id: &str,
) -> Result<Value, SdkError> {
    let registry = require_registry(registry)?;
    let did = Did::parse(id).map_err(|_| SdkError::Did(format!("Invalid DID: {}", id)))?;
    let abi = registry_abi()?;

    let args = [id_argument(&did)];
    let mut result = call_constant_function(client, &abi, Some(registry), method, &args, None)
        .await
        .map_err(|e| SdkError::Did(format!("Cannot call the contract: {}", e)))?;
    if result.len() != 1 {
        return Err(SdkError::Did(format!(
            "Expected single result but got: {}",
            Value::Array(result)
        )));
    }
    Ok(result.remove(0))
}

fn require_registry(registry: Option<&Address>) -> Result<&Address, SdkError> {
    registry.ok_or_else(|| SdkError::Did("Registry contract address required".to_string()))
}

fn registry_abi() -> Result<Abi, SdkError> {
    Abi::from_json(DID_REGISTRY_ABI)
        .map_err(|e| SdkError::Did(format!("Cannot initialize DIDRegistry ABI: {}", e)))
}

/// The DID id right-padded to 32 bytes, truncated if longer
fn id_argument(did: &Did) -> Value {
    let mut word = [0u8; 32];
    let id = did.id.as_bytes();
    let n = id.len().min(32);
    word[..n].copy_from_slice(&id[..n]);
    Value::String(H256::from_bytes(word).to_hex())
}
