//! # web3-primitives
//!
//! Fixed-size primitives shared by the web3 client crates.
//!
//! - [`Address`]: 20-byte account address with EIP-55 checksum formatting
//! - [`H256`]: 32-byte hash
//! - [`U256`]: 256-bit unsigned integer (re-exported from `primitive-types`)

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;

pub use address::{is_hex_address, Address, AddressError};
pub use error::PrimitiveError;
pub use hash::{Hash, HashError, H256};

pub use primitive_types::U256;

/// Block number type
pub type BlockNumber = u64;

/// Transaction nonce type
pub type Nonce = u64;

/// Gas type
pub type Gas = u64;

/// Strip an optional `0x`/`0X` prefix.
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
