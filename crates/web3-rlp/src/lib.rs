//! # web3-rlp
//!
//! RLP (Recursive Length Prefix) helpers used when encoding transactions.
//!
//! Thin layer over the `rlp` crate. Primitive types pick up their
//! `Encodable`/`Decodable` impls from `web3-primitives` with the `rlp`
//! feature enabled.
//!
//! ## RLP Encoding Rules
//!
//! - Single byte `[0x00, 0x7f]`: itself
//! - Short string (0-55 bytes): `0x80 + len` + data
//! - Long string (>55 bytes): `0xb7 + len_of_len` + len + data
//! - Short list (0-55 bytes payload): `0xc0 + len` + items
//! - Long list (>55 bytes payload): `0xf7 + len_of_len` + len + items

#![warn(missing_docs)]
#![warn(clippy::all)]

use bytes::Bytes;

pub use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
pub use web3_primitives::{Address, H256, U256};

/// Encode a value to RLP bytes
pub fn encode<T: Encodable>(value: &T) -> Vec<u8> {
    rlp::encode(value).to_vec()
}

/// Decode RLP bytes to a value
pub fn decode<T: Decodable>(data: &[u8]) -> Result<T, DecoderError> {
    rlp::decode(data)
}

/// Append a recipient. Contract creation encodes as the empty string.
pub fn append_to(stream: &mut RlpStream, to: Option<&Address>) {
    match to {
        Some(addr) => {
            stream.append(addr);
        }
        None => {
            stream.append_empty_data();
        }
    }
}

/// Append raw bytes as an RLP string
pub fn append_bytes(stream: &mut RlpStream, data: &Bytes) {
    stream.append(&data.to_vec());
}

/// Append a 32-byte big-endian scalar with leading zeros stripped.
pub fn append_scalar(stream: &mut RlpStream, word: &[u8; 32]) {
    stream.append(&U256::from_big_endian(word));
}

/// Append an empty EIP-2930 access list
pub fn append_empty_access_list(stream: &mut RlpStream) {
    stream.begin_list(0);
}
