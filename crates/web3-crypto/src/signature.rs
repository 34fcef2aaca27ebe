//! ECDSA signature operations using secp256k1

use crate::{keccak256, CryptoError};
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey, VerifyingKey};
use web3_primitives::{Address, H256};

/// Half of the secp256k1 curve order (n/2)
const SECP256K1_N_DIV_2: [u8; 32] = [
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
];

/// Recoverable ECDSA signature.
///
/// `v` is the raw recovery id (0 or 1). Transaction encoders add their own
/// offset (EIP-155 or 27).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    /// r component (32 bytes)
    pub r: [u8; 32],
    /// s component (32 bytes)
    pub s: [u8; 32],
    /// recovery id
    pub v: u8,
}

/// Public key
pub type PublicKey = VerifyingKey;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

impl Signature {
    /// Create signature from r, s, v components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Signature { r, s, v }
    }

    /// Recovery id (0 or 1), accepting the legacy 27/28 form too.
    pub fn recovery_id(&self) -> u8 {
        if self.v >= 27 {
            self.v - 27
        } else {
            self.v
        }
    }

    /// 65-byte representation (r || s || v)
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    /// 64-byte compact representation (r || s), without the recovery id.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    /// Parse from 65-byte representation
    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Signature { r, s, v: bytes[64] }
    }

    /// Check if signature has low-s value (EIP-2)
    pub fn is_low_s(&self) -> bool {
        self.s <= SECP256K1_N_DIV_2
    }

    fn to_k256(&self) -> Result<K256Signature, CryptoError> {
        let r: k256::FieldBytes = self.r.into();
        let s: k256::FieldBytes = self.s.into();
        K256Signature::from_scalars(r, s).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

/// Sign a 32-byte hash with a private key. The result is always low-s.
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (mut signature, mut recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::try_from(recovery_id.to_byte() ^ 1)
            .map_err(|_| CryptoError::SigningFailed("recovery id out of range".to_string()))?;
    }

    Ok(Signature {
        r: signature.r().to_bytes().into(),
        s: signature.s().to_bytes().into(),
        v: recovery_id.to_byte(),
    })
}

/// Verify a signature against a message hash and public key
pub fn verify(
    message_hash: &H256,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<bool, CryptoError> {
    if !signature.is_low_s() {
        return Ok(false);
    }
    let sig = signature.to_k256()?;
    Ok(public_key.verify_prehash(message_hash.as_bytes(), &sig).is_ok())
}

/// Verify a 64-byte `r || s` signature against an encoded public key
/// (33-byte compressed or 65-byte uncompressed).
///
/// Malformed keys or signatures verify as false.
pub fn verify_compact(public_key: &[u8], message_hash: &H256, signature: &[u8]) -> bool {
    if signature.len() != 64 {
        return false;
    }
    let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    s.copy_from_slice(&signature[32..]);
    verify(message_hash, &Signature::new(r, s, 0), &key).unwrap_or(false)
}

/// Recover public key from signature and message hash
pub fn recover_public_key(
    message_hash: &H256,
    signature: &Signature,
) -> Result<PublicKey, CryptoError> {
    let sig = signature.to_k256()?;
    let recovery_id = RecoveryId::try_from(signature.recovery_id())
        .map_err(|_| CryptoError::InvalidRecoveryId(signature.recovery_id()))?;

    VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))
}

/// Derive the account address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    // 0x04 || x || y
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);
    Address::from_word(hash.as_bytes())
}
