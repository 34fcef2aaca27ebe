//! Wallet and account management

use web3_crypto::{
    generate_private_key, keccak256, private_key_from_hex, private_key_to_hex,
    public_key_to_address, public_key_to_bytes, sign, PrivateKey, PublicKey, Signature,
};
use web3_primitives::{Address, H256};
use zeroize::Zeroize;

use crate::SdkError;

/// Wallet holding one secp256k1 key
///
/// Clone is not implemented so the key is never duplicated by accident.
pub struct Wallet {
    private_key: PrivateKey,
    address: Address,
}

impl Wallet {
    /// Create a new random wallet
    pub fn random() -> Self {
        Self::from_signing_key(generate_private_key())
    }

    /// Create a wallet from a 32-byte private key
    pub fn from_bytes(key: &[u8; 32]) -> Result<Self, SdkError> {
        let private_key =
            PrivateKey::from_slice(key).map_err(|e| SdkError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self::from_signing_key(private_key))
    }

    /// Create a wallet from a hex private key, with or without `0x`
    pub fn from_private_key(hex: &str) -> Result<Self, SdkError> {
        let mut trimmed = hex.trim().to_string();
        let result = private_key_from_hex(&trimmed)
            .map(Self::from_signing_key)
            .map_err(|e| SdkError::InvalidPrivateKey(e.to_string()));
        trimmed.zeroize();
        result
    }

    fn from_signing_key(private_key: PrivateKey) -> Self {
        let address = public_key_to_address(private_key.verifying_key());
        Self {
            private_key,
            address,
        }
    }

    /// Get the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Get the wallet's public key
    pub fn public_key(&self) -> &PublicKey {
        self.private_key.verifying_key()
    }

    /// Uncompressed public key as 0x-prefixed hex (65 bytes)
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(public_key_to_bytes(self.public_key())))
    }

    /// Private key as 0x-prefixed hex
    pub fn private_key_hex(&self) -> String {
        private_key_to_hex(&self.private_key)
    }

    pub(crate) fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Sign a message hash (32 bytes)
    pub fn sign_hash(&self, hash: &H256) -> Result<Signature, SdkError> {
        sign(hash, &self.private_key).map_err(|e| SdkError::SigningFailed(e.to_string()))
    }

    /// Sign a message with the Ethereum personal sign prefix
    ///
    /// Prefixes the message with "\x19Ethereum Signed Message:\n{len}"
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, SdkError> {
        self.sign_hash(&hash_message(message))
    }
}

/// Hash of a message under the personal sign prefix
pub fn hash_message(message: &[u8]) -> H256 {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut data = prefix.into_bytes();
    data.extend_from_slice(message);
    keccak256(&data)
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3_crypto::recover_public_key;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_wallet_random() {
        let wallet = Wallet::random();
        assert_ne!(wallet.address(), &Address::ZERO);
    }

    #[test]
    fn test_wallet_from_hex() {
        let wallet = Wallet::from_private_key(TEST_KEY).unwrap();
        assert_eq!(
            wallet.address().to_hex(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(wallet.private_key_hex(), TEST_KEY);
    }

    #[test]
    fn test_wallet_from_hex_no_prefix() {
        let wallet = Wallet::from_private_key(&TEST_KEY[2..]).unwrap();
        assert_eq!(
            wallet.address().to_hex(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_wallet_invalid_key() {
        let err = Wallet::from_private_key("0x1234").unwrap_err();
        assert!(err.to_string().starts_with("invalid private key: "));
        assert!(Wallet::from_bytes(&[0u8; 32]).is_err());
    }

    #[test]
    fn test_sign_message_recovers_to_address() {
        let wallet = Wallet::from_private_key(TEST_KEY).unwrap();
        let sig = wallet.sign_message(b"hello").unwrap();
        let recovered = recover_public_key(&hash_message(b"hello"), &sig).unwrap();
        assert_eq!(public_key_to_address(&recovered), *wallet.address());
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = Wallet::from_private_key(TEST_KEY).unwrap();
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains("ac0974"));
        assert!(debug.contains("Wallet"));
    }

    #[test]
    fn test_public_key_hex() {
        let wallet = Wallet::random();
        let hex = wallet.public_key_hex();
        assert!(hex.starts_with("0x04"));
        assert_eq!(hex.len(), 2 + 130);
    }
}
