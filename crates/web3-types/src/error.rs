//! Type-level errors

use thiserror::Error;
use web3_crypto::CryptoError;

/// Errors raised while building, signing or decoding transactions
#[derive(Debug, Error)]
pub enum TypeError {
    /// Signing failed
    #[error("signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// Chain id not usable for replay protection
    #[error("invalid chain id: {0}")]
    InvalidChainId(u64),

    /// RLP decoding failed
    #[error("rlp: {0}")]
    Rlp(#[from] web3_rlp::DecoderError),

    /// Unknown typed transaction envelope
    #[error("unsupported transaction type: {0:#x}")]
    UnsupportedTxType(u8),
}
