//! SDK error types

use thiserror::Error;

/// SDK error type
#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport/network error
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// The node returned `null` for a block, transaction or receipt
    #[error("not found")]
    NotFound,

    /// A poll loop was cancelled before it completed
    #[error("cancelled")]
    Cancelled,

    /// Invalid address format
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid private key
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Signing failed
    #[error("cannot sign transaction: {0}")]
    SigningFailed(String),

    /// ABI encoding error
    #[error("failed to pack values: {0}")]
    AbiEncode(String),

    /// ABI decoding error
    #[error("failed to unpack values: {0}")]
    AbiDecode(String),

    /// Argument or output conversion error
    #[error("{0}")]
    Convert(String),

    /// No ABI event matches a log's first topic
    #[error("no event in ABI matches topic {0}")]
    EventNotFound(String),

    /// Transaction build error
    #[error("{0}")]
    TxBuild(String),

    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(String),

    /// Invalid chain ID
    #[error("invalid chain ID: {0}")]
    InvalidChainId(String),

    /// DID parsing or registry error
    #[error("{0}")]
    Did(String),

    /// Compiler invocation error
    #[error("{0}")]
    Compiler(String),

    /// Filesystem error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Amount parsing error
    #[error("{0}")]
    Units(String),
}

impl SdkError {
    /// Whether the error is the node's `null` answer
    pub fn is_not_found(&self) -> bool {
        matches!(self, SdkError::NotFound)
    }
}

impl From<hex::FromHexError> for SdkError {
    fn from(e: hex::FromHexError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Serialization(e.to_string())
    }
}

impl From<web3_crypto::CryptoError> for SdkError {
    fn from(e: web3_crypto::CryptoError) -> Self {
        SdkError::SigningFailed(e.to_string())
    }
}

impl From<web3_primitives::AddressError> for SdkError {
    fn from(e: web3_primitives::AddressError) -> Self {
        SdkError::InvalidAddress(e.to_string())
    }
}

impl From<web3_primitives::HashError> for SdkError {
    fn from(e: web3_primitives::HashError) -> Self {
        SdkError::InvalidHex(e.to_string())
    }
}

impl From<web3_types::TypeError> for SdkError {
    fn from(e: web3_types::TypeError) -> Self {
        match e {
            web3_types::TypeError::InvalidChainId(id) => SdkError::InvalidChainId(id.to_string()),
            other => SdkError::SigningFailed(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        SdkError::Transport(e.to_string())
    }
}
