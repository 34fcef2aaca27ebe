//! Encrypted key files in the Web3 Secret Storage (V3) format
//!
//! scrypt derives a 32 byte key from the password. The first half
//! encrypts the private key with AES-128-CTR; the second half is hashed with
//! the ciphertext into the MAC.

use aes::cipher::{KeyIvInit, StreamCipher};
use rand::{rngs::OsRng, RngCore};
use scrypt::{scrypt, Params as ScryptParams};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use web3_crypto::keccak256;
use web3_sdk::Wallet;

use crate::CliError;

type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// Scrypt cost used by geth's "standard" setting
pub const STANDARD_SCRYPT_N: u32 = 1 << 18;
/// Scrypt parallelization used by geth's "standard" setting
pub const STANDARD_SCRYPT_P: u32 = 1;
/// Scrypt cost used by geth's "light" setting
pub const LIGHT_SCRYPT_N: u32 = 1 << 12;
/// Scrypt parallelization used by geth's "light" setting
pub const LIGHT_SCRYPT_P: u32 = 6;

const SCRYPT_R: u32 = 8;
const DKLEN: u32 = 32;

/// Web3 Keystore format (V3)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreV3 {
    /// Keystore version
    pub version: u32,

    /// Unique identifier
    pub id: String,

    /// Address without 0x prefix
    #[serde(default)]
    pub address: String,

    /// Crypto parameters
    #[serde(alias = "Crypto")]
    pub crypto: KeystoreCrypto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeystoreCrypto {
    /// Cipher algorithm (aes-128-ctr)
    pub cipher: String,

    /// Ciphertext (hex)
    pub ciphertext: String,

    pub cipherparams: CipherParams,

    /// Key derivation function
    pub kdf: String,

    pub kdfparams: KdfParams,

    /// keccak256(derived_key[16..32] || ciphertext)
    pub mac: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherParams {
    /// Initialization vector (hex)
    pub iv: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    pub dklen: u32,
    pub n: u32,
    pub r: u32,
    pub p: u32,
    /// Salt (hex)
    pub salt: String,
}

/// Encrypt the wallet's key under `password`
pub fn encrypt(wallet: &Wallet, password: &str, n: u32, p: u32) -> Result<KeystoreV3, CliError> {
    let mut salt = [0u8; 32];
    let mut iv = [0u8; 16];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let derived_key = derive_key(password, &salt, n, SCRYPT_R, p, DKLEN)?;

    let key_hex = wallet.private_key_hex();
    let mut ciphertext = hex::decode(key_hex.trim_start_matches("0x"))
        .map_err(|e| CliError::Keystore(e.to_string()))?;
    let mut cipher = Aes128Ctr::new(derived_key[..16].into(), iv.as_slice().into());
    cipher.apply_keystream(&mut ciphertext);

    let mac = mac(&derived_key, &ciphertext);

    Ok(KeystoreV3 {
        version: 3,
        id: Uuid::new_v4().to_string(),
        address: wallet.address().to_hex()[2..].to_string(),
        crypto: KeystoreCrypto {
            cipher: "aes-128-ctr".to_string(),
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParams {
                iv: hex::encode(iv),
            },
            kdf: "scrypt".to_string(),
            kdfparams: KdfParams {
                dklen: DKLEN,
                n,
                r: SCRYPT_R,
                p,
                salt: hex::encode(salt),
            },
            mac: hex::encode(mac),
        },
    })
}

/// Decrypt a keystore and check it against its recorded address
pub fn decrypt(keystore: &KeystoreV3, password: &str) -> Result<Wallet, CliError> {
    if keystore.version != 3 {
        return Err(CliError::Keystore(format!(
            "version not supported: {}",
            keystore.version
        )));
    }
    let crypto = &keystore.crypto;
    if crypto.cipher != "aes-128-ctr" {
        return Err(CliError::Keystore(format!(
            "cipher not supported: {}",
            crypto.cipher
        )));
    }
    if crypto.kdf != "scrypt" {
        return Err(CliError::Keystore(format!("KDF not supported: {}", crypto.kdf)));
    }

    let salt = decode_field("salt", &crypto.kdfparams.salt)?;
    let iv = decode_field("iv", &crypto.cipherparams.iv)?;
    let ciphertext = decode_field("ciphertext", &crypto.ciphertext)?;
    let expected_mac = decode_field("mac", &crypto.mac)?;
    if iv.len() != 16 {
        return Err(CliError::Keystore(format!("invalid iv length {}", iv.len())));
    }

    let params = &crypto.kdfparams;
    let derived_key = derive_key(password, &salt, params.n, params.r, params.p, params.dklen)?;
    if derived_key.len() < 32 {
        return Err(CliError::Keystore(format!("dklen too small: {}", params.dklen)));
    }

    if mac(&derived_key, &ciphertext).as_slice() != expected_mac.as_slice() {
        return Err(CliError::Keystore(
            "could not decrypt key with given password".to_string(),
        ));
    }

    let mut plaintext = ciphertext;
    let mut cipher = Aes128Ctr::new(derived_key[..16].into(), iv.as_slice().into());
    cipher.apply_keystream(&mut plaintext);

    let key: [u8; 32] = plaintext.as_slice().try_into().map_err(|_| {
        CliError::Keystore(format!("decrypted key has invalid length {}", plaintext.len()))
    })?;
    let wallet = Wallet::from_bytes(&key)?;

    if !keystore.address.is_empty() {
        let recorded = keystore.address.trim_start_matches("0x").to_lowercase();
        let actual = &wallet.address().to_hex()[2..];
        if recorded != actual {
            return Err(CliError::Keystore(format!(
                "address mismatch: keystore has 0x{}, key is 0x{}",
                recorded, actual
            )));
        }
    }
    Ok(wallet)
}

fn derive_key(
    password: &str,
    salt: &[u8],
    n: u32,
    r: u32,
    p: u32,
    dklen: u32,
) -> Result<Vec<u8>, CliError> {
    if n < 2 || !n.is_power_of_two() {
        return Err(CliError::Keystore(format!(
            "scrypt n must be a power of two, got {}",
            n
        )));
    }
    let params = ScryptParams::new(n.trailing_zeros() as u8, r, p, dklen as usize)
        .map_err(|e| CliError::Keystore(format!("invalid scrypt params: {}", e)))?;
    let mut derived_key = vec![0u8; dklen as usize];
    scrypt(password.as_bytes(), salt, &params, &mut derived_key)
        .map_err(|e| CliError::Keystore(format!("scrypt failed: {}", e)))?;
    Ok(derived_key)
}

fn mac(derived_key: &[u8], ciphertext: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(16 + ciphertext.len());
    data.extend_from_slice(&derived_key[16..32]);
    data.extend_from_slice(ciphertext);
    *keccak256(&data).as_bytes()
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, CliError> {
    hex::decode(value.trim_start_matches("0x"))
        .map_err(|e| CliError::Keystore(format!("invalid {}: {}", name, e)))
}
