//! Signable transactions
//!
//! Legacy transactions are signed with EIP-155 replay protection. Dynamic fee
//! transactions use the EIP-2718 envelope `0x02 || rlp(...)` with an empty
//! access list.

use crate::TypeError;
use bytes::Bytes;
use web3_crypto::{keccak256, public_key_to_address, recover_public_key, sign, PrivateKey, Signature};
use web3_primitives::{Address, H256, U256};
use web3_rlp::{append_bytes, append_empty_access_list, append_scalar, append_to, Rlp, RlpStream};

/// Transaction type identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TxType {
    /// Legacy transaction (pre-EIP-2718)
    #[default]
    Legacy = 0,
    /// EIP-1559 dynamic fee transaction
    DynamicFee = 2,
}

/// Legacy transaction (type 0)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyTx {
    /// Sender nonce
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    /// Value in wei
    pub value: U256,
    /// Call data or init code
    pub data: Bytes,
}

impl Default for LegacyTx {
    fn default() -> Self {
        Self {
            nonce: 0,
            gas_price: U256::zero(),
            gas_limit: 21000,
            to: None,
            value: U256::zero(),
            data: Bytes::new(),
        }
    }
}

impl LegacyTx {
    /// EIP-155 signing hash:
    /// `keccak(rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0]))`
    pub fn signing_hash(&self, chain_id: u64) -> H256 {
        let mut s = RlpStream::new_list(9);
        self.append_fields(&mut s);
        s.append(&chain_id);
        s.append(&0u8);
        s.append(&0u8);
        keccak256(&s.out())
    }

    /// Sign for `chain_id`, producing `v = recid + chainId * 2 + 35`.
    pub fn sign(self, key: &PrivateKey, chain_id: u64) -> Result<SignedTransaction, TypeError> {
        if chain_id == 0 {
            return Err(TypeError::InvalidChainId(chain_id));
        }
        // v must fit for either recovery id
        let v_max = chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(36))
            .ok_or(TypeError::InvalidChainId(chain_id))?;
        let sig = sign(&self.signing_hash(chain_id), key)?;
        let v = v_max - 1 + u64::from(sig.v);
        Ok(SignedTransaction::new(
            TransactionBody::Legacy(self),
            TxSignature::new(v, H256::from_bytes(sig.r), H256::from_bytes(sig.s)),
        ))
    }

    fn append_fields(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        append_to(s, self.to.as_ref());
        s.append(&self.value);
        append_bytes(s, &self.data);
    }
}

/// EIP-1559 dynamic fee transaction (type 2)
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DynamicFeeTx {
    /// Chain id
    pub chain_id: u64,
    /// Sender nonce
    pub nonce: u64,
    /// Tip per gas
    pub max_priority_fee_per_gas: U256,
    /// Fee cap per gas
    pub max_fee_per_gas: U256,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient; `None` for contract creation
    pub to: Option<Address>,
    /// Value in wei
    pub value: U256,
    /// Call data or init code
    pub data: Bytes,
}

impl DynamicFeeTx {
    /// `keccak(0x02 || rlp([chainId, nonce, tip, feeCap, gas, to, value, data, accessList]))`
    pub fn signing_hash(&self) -> H256 {
        let mut s = RlpStream::new_list(9);
        self.append_fields(&mut s);
        let mut buf = vec![TxType::DynamicFee as u8];
        buf.extend_from_slice(&s.out());
        keccak256(&buf)
    }

    /// Sign; `v` is the raw recovery id.
    pub fn sign(self, key: &PrivateKey) -> Result<SignedTransaction, TypeError> {
        if self.chain_id == 0 {
            return Err(TypeError::InvalidChainId(0));
        }
        let sig = sign(&self.signing_hash(), key)?;
        Ok(SignedTransaction::new(
            TransactionBody::DynamicFee(self),
            TxSignature::new(sig.v as u64, H256::from_bytes(sig.r), H256::from_bytes(sig.s)),
        ))
    }

    fn append_fields(&self, s: &mut RlpStream) {
        s.append(&self.chain_id);
        s.append(&self.nonce);
        s.append(&self.max_priority_fee_per_gas);
        s.append(&self.max_fee_per_gas);
        s.append(&self.gas_limit);
        append_to(s, self.to.as_ref());
        s.append(&self.value);
        append_bytes(s, &self.data);
        append_empty_access_list(s);
    }
}

/// Signature components as carried on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSignature {
    /// V (EIP-155 encoded for legacy, recovery id for typed)
    pub v: u64,
    /// R component
    pub r: H256,
    /// S component
    pub s: H256,
}

impl TxSignature {
    /// Create a new signature
    pub fn new(v: u64, r: H256, s: H256) -> Self {
        Self { v, r, s }
    }
}

/// Unsigned transaction body
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionBody {
    /// Legacy transaction
    Legacy(LegacyTx),
    /// EIP-1559 transaction
    DynamicFee(DynamicFeeTx),
}

/// Signed transaction ready for `eth_sendRawTransaction`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Transaction body
    pub body: TransactionBody,
    /// Signature
    pub signature: TxSignature,
}

impl SignedTransaction {
    /// Assemble from body and signature
    pub fn new(body: TransactionBody, signature: TxSignature) -> Self {
        Self { body, signature }
    }

    /// Transaction type
    pub fn tx_type(&self) -> TxType {
        match self.body {
            TransactionBody::Legacy(_) => TxType::Legacy,
            TransactionBody::DynamicFee(_) => TxType::DynamicFee,
        }
    }

    /// Sender nonce
    pub fn nonce(&self) -> u64 {
        match &self.body {
            TransactionBody::Legacy(tx) => tx.nonce,
            TransactionBody::DynamicFee(tx) => tx.nonce,
        }
    }

    /// Recipient
    pub fn to(&self) -> Option<&Address> {
        match &self.body {
            TransactionBody::Legacy(tx) => tx.to.as_ref(),
            TransactionBody::DynamicFee(tx) => tx.to.as_ref(),
        }
    }

    /// Gas limit
    pub fn gas_limit(&self) -> u64 {
        match &self.body {
            TransactionBody::Legacy(tx) => tx.gas_limit,
            TransactionBody::DynamicFee(tx) => tx.gas_limit,
        }
    }

    /// Value in wei
    pub fn value(&self) -> U256 {
        match &self.body {
            TransactionBody::Legacy(tx) => tx.value,
            TransactionBody::DynamicFee(tx) => tx.value,
        }
    }

    /// Chain id the signature commits to, if any
    pub fn chain_id(&self) -> Option<u64> {
        match &self.body {
            TransactionBody::Legacy(_) if self.signature.v >= 35 => {
                Some((self.signature.v - 35) / 2)
            }
            TransactionBody::Legacy(_) => None,
            TransactionBody::DynamicFee(tx) => Some(tx.chain_id),
        }
    }

    /// Canonical encoding submitted to the node
    pub fn encode(&self) -> Vec<u8> {
        let mut s = RlpStream::new_list(if self.tx_type() == TxType::Legacy { 9 } else { 12 });
        match &self.body {
            TransactionBody::Legacy(tx) => tx.append_fields(&mut s),
            TransactionBody::DynamicFee(tx) => tx.append_fields(&mut s),
        }
        s.append(&self.signature.v);
        append_scalar(&mut s, self.signature.r.as_bytes());
        append_scalar(&mut s, self.signature.s.as_bytes());

        match self.tx_type() {
            TxType::Legacy => s.out().to_vec(),
            TxType::DynamicFee => {
                let mut buf = vec![TxType::DynamicFee as u8];
                buf.extend_from_slice(&s.out());
                buf
            }
        }
    }

    /// Transaction hash (keccak of the canonical encoding)
    pub fn hash(&self) -> H256 {
        keccak256(&self.encode())
    }

    /// Recover the sender address from the signature
    pub fn recover_sender(&self) -> Result<Address, TypeError> {
        let (hash, recid) = match &self.body {
            TransactionBody::Legacy(tx) => match self.chain_id() {
                Some(chain_id) => (
                    tx.signing_hash(chain_id),
                    self.signature.v - 35 - chain_id * 2,
                ),
                None => {
                    let mut s = RlpStream::new_list(6);
                    tx.append_fields(&mut s);
                    (keccak256(&s.out()), self.signature.v.saturating_sub(27))
                }
            },
            TransactionBody::DynamicFee(tx) => (tx.signing_hash(), self.signature.v),
        };
        let sig = Signature::new(
            *self.signature.r.as_bytes(),
            *self.signature.s.as_bytes(),
            recid as u8,
        );
        Ok(public_key_to_address(&recover_public_key(&hash, &sig)?))
    }

    /// Decode a raw legacy or type-2 transaction
    pub fn decode(raw: &[u8]) -> Result<Self, TypeError> {
        match raw.first() {
            None => Err(TypeError::Rlp(web3_rlp::DecoderError::RlpIsTooShort)),
            Some(&t) if t == TxType::DynamicFee as u8 => Self::decode_dynamic_fee(&raw[1..]),
            Some(&t) if t < 0xc0 => Err(TypeError::UnsupportedTxType(t)),
            Some(_) => Self::decode_legacy(raw),
        }
    }

    fn decode_legacy(raw: &[u8]) -> Result<Self, TypeError> {
        let rlp = Rlp::new(raw);
        if rlp.item_count()? != 9 {
            return Err(TypeError::Rlp(web3_rlp::DecoderError::RlpIncorrectListLen));
        }
        let tx = LegacyTx {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            to: decode_to(&rlp.at(3)?)?,
            value: rlp.val_at(4)?,
            data: Bytes::from(rlp.val_at::<Vec<u8>>(5)?),
        };
        let signature = decode_signature(&rlp, 6)?;
        Ok(Self::new(TransactionBody::Legacy(tx), signature))
    }

    fn decode_dynamic_fee(raw: &[u8]) -> Result<Self, TypeError> {
        let rlp = Rlp::new(raw);
        if rlp.item_count()? != 12 {
            return Err(TypeError::Rlp(web3_rlp::DecoderError::RlpIncorrectListLen));
        }
        let tx = DynamicFeeTx {
            chain_id: rlp.val_at(0)?,
            nonce: rlp.val_at(1)?,
            max_priority_fee_per_gas: rlp.val_at(2)?,
            max_fee_per_gas: rlp.val_at(3)?,
            gas_limit: rlp.val_at(4)?,
            to: decode_to(&rlp.at(5)?)?,
            value: rlp.val_at(6)?,
            data: Bytes::from(rlp.val_at::<Vec<u8>>(7)?),
        };
        let signature = decode_signature(&rlp, 9)?;
        Ok(Self::new(TransactionBody::DynamicFee(tx), signature))
    }
}

fn decode_to(item: &Rlp) -> Result<Option<Address>, TypeError> {
    if item.is_empty() {
        Ok(None)
    } else {
        Ok(Some(item.as_val()?))
    }
}

fn decode_signature(rlp: &Rlp, at: usize) -> Result<TxSignature, TypeError> {
    let v: u64 = rlp.val_at(at)?;
    let r: U256 = rlp.val_at(at + 1)?;
    let s: U256 = rlp.val_at(at + 2)?;
    let mut r_bytes = [0u8; 32];
    let mut s_bytes = [0u8; 32];
    r.to_big_endian(&mut r_bytes);
    s.to_big_endian(&mut s_bytes);
    Ok(TxSignature::new(v, H256::from_bytes(r_bytes), H256::from_bytes(s_bytes)))
}
