//! ABI type definitions

use std::fmt;
use web3_primitives::{Address, H256, U256};

/// Solidity ABI token types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Address (20 bytes)
    Address(Address),
    /// Unsigned integer (8-256 bits)
    Uint(U256),
    /// Signed integer (8-256 bits)
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Dynamic bytes
    Bytes(Vec<u8>),
    /// Fixed-size bytes (1-32)
    FixedBytes(Vec<u8>),
    /// UTF-8 string
    String(String),
    /// Dynamic array
    Array(Vec<Token>),
    /// Fixed-size array
    FixedArray(Vec<Token>),
    /// Tuple (struct)
    Tuple(Vec<Token>),
}

/// Signed 256-bit integer as sign and magnitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct I256 {
    /// Absolute value
    pub abs: U256,
    /// Sign (true if negative)
    pub negative: bool,
}

impl I256 {
    /// Create a new I256; negative zero is normalized to zero.
    pub fn new(abs: U256, negative: bool) -> Self {
        Self {
            abs,
            negative: negative && !abs.is_zero(),
        }
    }

    /// Create from i128
    pub fn from_i128(value: i128) -> Self {
        Self::new(U256::from(value.unsigned_abs()), value < 0)
    }

    /// Check if zero
    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    /// Whether the value fits a signed integer of `bits` width
    pub fn fits_signed(&self, bits: usize) -> bool {
        if bits == 0 || bits > 256 {
            return false;
        }
        let limit = U256::one() << (bits - 1);
        if self.negative {
            self.abs <= limit
        } else {
            self.abs < limit
        }
    }

    /// Whether the value fits an unsigned integer of `bits` width
    pub fn fits_unsigned(&self, bits: usize) -> bool {
        if self.negative || bits == 0 || bits > 256 {
            return false;
        }
        bits == 256 || self.abs < (U256::one() << bits)
    }

    /// Value as `i64` if it fits
    pub fn to_i64(&self) -> Option<i64> {
        if !self.fits_signed(64) {
            return None;
        }
        let abs = self.abs.low_u64();
        Some(if self.negative {
            (abs as i64).wrapping_neg()
        } else {
            abs as i64
        })
    }

    /// 256-bit two's complement encoding
    pub fn to_twos_complement(&self) -> U256 {
        if self.negative {
            (!self.abs).overflowing_add(U256::one()).0
        } else {
            self.abs
        }
    }

    /// Read a 256-bit two's complement word
    pub fn from_twos_complement(word: U256) -> Self {
        if word.bit(255) {
            Self::new((!word).overflowing_add(U256::one()).0, true)
        } else {
            Self::new(word, false)
        }
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.abs)
        } else {
            write!(f, "{}", self.abs)
        }
    }
}

/// Solidity parameter types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// Address
    Address,
    /// Unsigned integer with bit size (8, 16, ..., 256)
    Uint(usize),
    /// Signed integer with bit size
    Int(usize),
    /// Boolean
    Bool,
    /// Dynamic bytes
    Bytes,
    /// Fixed-size bytes (size 1-32)
    FixedBytes(usize),
    /// UTF-8 string
    String,
    /// Dynamic array
    Array(Box<ParamType>),
    /// Fixed-size array
    FixedArray(Box<ParamType>, usize),
    /// Tuple
    Tuple(Vec<ParamType>),
    /// 32-byte hash; encodes as `bytes32`
    Hash,
}

impl ParamType {
    /// Check if this type is dynamic (variable length)
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(types) => types.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Bytes this type occupies in the head of an enclosing tuple
    pub fn head_length(&self) -> usize {
        match self {
            _ if self.is_dynamic() => 32,
            ParamType::FixedArray(inner, size) => inner.head_length().saturating_mul(*size),
            ParamType::Tuple(types) => types
                .iter()
                .map(ParamType::head_length)
                .fold(0, usize::saturating_add),
            _ => 32,
        }
    }
}

/// Canonical type name as used in signatures
impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::FixedBytes(size) => write!(f, "bytes{size}"),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::FixedArray(inner, size) => write!(f, "{inner}[{size}]"),
            ParamType::Tuple(types) => {
                f.write_str("(")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{t}")?;
                }
                f.write_str(")")
            }
            ParamType::Hash => f.write_str("bytes32"),
        }
    }
}

impl Token {
    /// Create a uint256 from u128
    pub fn uint256_from_u128(value: u128) -> Self {
        Token::Uint(U256::from(value))
    }

    /// Create a bytes32 token
    pub fn bytes32(data: H256) -> Self {
        Token::FixedBytes(data.as_bytes().to_vec())
    }

    /// Get the type of this token
    pub fn type_of(&self) -> ParamType {
        match self {
            Token::Address(_) => ParamType::Address,
            Token::Uint(_) => ParamType::Uint(256),
            Token::Int(_) => ParamType::Int(256),
            Token::Bool(_) => ParamType::Bool,
            Token::Bytes(_) => ParamType::Bytes,
            Token::FixedBytes(b) => ParamType::FixedBytes(b.len()),
            Token::String(_) => ParamType::String,
            Token::Array(tokens) => {
                let inner = tokens.first().map(|t| t.type_of()).unwrap_or(ParamType::Uint(256));
                ParamType::Array(Box::new(inner))
            }
            Token::FixedArray(tokens) => {
                let inner = tokens.first().map(|t| t.type_of()).unwrap_or(ParamType::Uint(256));
                ParamType::FixedArray(Box::new(inner), tokens.len())
            }
            Token::Tuple(tokens) => ParamType::Tuple(tokens.iter().map(|t| t.type_of()).collect()),
        }
    }
}
