//! Key generation and encoding

use crate::{CryptoError, PrivateKey, PublicKey};
use rand::rngs::OsRng;
use web3_primitives::strip_0x;

/// Generate a new random private key
pub fn generate_private_key() -> PrivateKey {
    PrivateKey::random(&mut OsRng)
}

/// Parse a hex private key, with or without the 0x prefix.
pub fn private_key_from_hex(s: &str) -> Result<PrivateKey, CryptoError> {
    let bytes =
        hex::decode(strip_0x(s.trim())).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(CryptoError::InvalidPrivateKey(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    PrivateKey::from_slice(&bytes).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Encode a private key as 0x-prefixed hex
pub fn private_key_to_hex(key: &PrivateKey) -> String {
    format!("0x{}", hex::encode(key.to_bytes()))
}

/// Uncompressed SEC1 encoding (65 bytes, leading 0x04)
pub fn public_key_to_bytes(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

/// Parse a SEC1-encoded public key (compressed or uncompressed)
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    PublicKey::from_sec1_bytes(bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_hex_roundtrip() {
        let key = generate_private_key();
        let hex = private_key_to_hex(&key);
        assert!(hex.starts_with("0x"));
        assert_eq!(hex.len(), 66);

        let parsed = private_key_from_hex(&hex).unwrap();
        assert_eq!(parsed.to_bytes(), key.to_bytes());

        let no_prefix = private_key_from_hex(&hex[2..]).unwrap();
        assert_eq!(no_prefix.to_bytes(), key.to_bytes());
    }

    #[test]
    fn test_private_key_rejects_bad_input() {
        assert!(private_key_from_hex("0x1234").is_err());
        assert!(private_key_from_hex("not hex").is_err());
        // zero is not a valid scalar
        assert!(private_key_from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn test_public_key_bytes_roundtrip() {
        let key = generate_private_key();
        let bytes = public_key_to_bytes(key.verifying_key());
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x04);
        let parsed = public_key_from_bytes(&bytes).unwrap();
        assert_eq!(&parsed, key.verifying_key());
    }
}
