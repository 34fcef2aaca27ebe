//! # web3-crypto
//!
//! Cryptographic helpers for the web3 client.
//!
//! - Keccak-256 hashing
//! - ECDSA signing/verification (secp256k1)
//! - Public key recovery
//! - Address derivation
//! - Key generation and hex parsing

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod keys;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, keccak256_concat};
pub use keys::{
    generate_private_key, private_key_from_hex, private_key_to_hex, public_key_from_bytes,
    public_key_to_bytes,
};
pub use signature::{
    public_key_to_address, recover_public_key, sign, verify, verify_compact, PrivateKey,
    PublicKey, Signature,
};
