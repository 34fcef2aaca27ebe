//! Keccak-256 hashing

use sha3::{Digest, Keccak256};
use web3_primitives::H256;

/// Compute Keccak-256 hash of the input data
pub fn keccak256(data: &[u8]) -> H256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    H256::from_bytes(hasher.finalize().into())
}

/// Hash the concatenation of several slices without allocating.
pub fn keccak256_concat(parts: &[&[u8]]) -> H256 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    H256::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Known vectors ====================

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            keccak256(&[]).to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak256_hello() {
        assert_eq!(
            keccak256(b"hello").to_hex(),
            "0x1c8aff950685c2ed4bc3174f3472287b56d9517b9c948127319a09a7a36deac8"
        );
    }

    #[test]
    fn test_keccak256_transfer_signature() {
        // ERC20 Transfer event topic
        assert_eq!(
            keccak256(b"Transfer(address,address,uint256)").to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_keccak256_concat_matches_single() {
        let joined = keccak256(b"hello world");
        let parts = keccak256_concat(&[b"hello", b" ", b"world"]);
        assert_eq!(joined, parts);
    }
}
