//! Ethereum address type (20 bytes)

use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address parsing error
#[derive(Debug, Error)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Ethereum 20-byte address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// Size of address in bytes
    pub const LEN: usize = 20;

    /// Zero address (0x0000...0000)
    pub const ZERO: Address = Address([0u8; 20]);

    /// Create address from bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        if slice.len() != 20 {
            return Err(AddressError::InvalidLength(slice.len()));
        }
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(slice);
        Ok(Address(bytes))
    }

    /// Parse address from hex string (with or without 0x prefix).
    ///
    /// Checksum casing is not enforced.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let s = crate::strip_0x(s);
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Build an address from the low 20 bytes of a 32-byte word.
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Address(bytes)
    }

    /// Get as byte array
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Lowercase hex string with 0x prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum encoding.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                digest[i / 2] >> 4
            } else {
                digest[i / 2] & 0x0f
            };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Whether `s` is a 20-byte hex address, with or without the 0x prefix.
pub fn is_hex_address(s: &str) -> bool {
    let s = crate::strip_0x(s);
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(feature = "rlp")]
mod rlp_impl {
    use super::*;
    use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

    impl Encodable for Address {
        fn rlp_append(&self, s: &mut RlpStream) {
            s.encoder().encode_value(&self.0);
        }
    }

    impl Decodable for Address {
        fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
            rlp.decoder().decode_value(|bytes| {
                Address::from_slice(bytes).map_err(|_| DecoderError::RlpInvalidLength)
            })
        }
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&self.to_hex())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Parsing ====================

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert!(!addr.is_zero());

        let addr2 = Address::from_hex("742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        assert_eq!(addr, addr2);
    }

    #[test]
    fn test_address_from_str() {
        let addr: Address = "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d".parse().unwrap();
        assert_eq!(addr.to_hex(), "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d");
    }

    #[test]
    fn test_address_from_hex_invalid_chars() {
        match Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aGGG") {
            Err(AddressError::InvalidHex(_)) => {}
            other => panic!("expected InvalidHex, got {:?}", other),
        }
    }

    #[test]
    fn test_address_from_hex_wrong_length() {
        match Address::from_hex("0x742d35Cc") {
            Err(AddressError::InvalidLength(4)) => {}
            other => panic!("expected InvalidLength(4), got {:?}", other),
        }
        assert!(Address::from_hex("").is_err());
    }

    #[test]
    fn test_address_from_word() {
        let mut word = [0u8; 32];
        word[31] = 0x01;
        word[12] = 0xaa;
        let addr = Address::from_word(&word);
        assert_eq!(addr.as_bytes()[0], 0xaa);
        assert_eq!(addr.as_bytes()[19], 0x01);
    }

    // ==================== Checksum ====================

    #[test]
    fn test_checksum_known_vectors() {
        // EIP-55 reference vectors
        let vectors = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ];
        for v in vectors {
            let addr = Address::from_hex(v).unwrap();
            assert_eq!(addr.to_checksum(), v);
            assert_eq!(addr.to_string(), v);
        }
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_checksum(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    // ==================== is_hex_address ====================

    #[test]
    fn test_is_hex_address() {
        assert!(is_hex_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(is_hex_address("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(is_hex_address("0X5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED"));
        assert!(!is_hex_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeA"));
        assert!(!is_hex_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAedzz"));
        assert!(!is_hex_address("0xZaAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"));
        assert!(!is_hex_address(""));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let addr = Address::from_hex("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
