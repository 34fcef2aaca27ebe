//! Conversion between untyped call arguments and ABI values
//!
//! Arguments arrive as JSON values (usually strings typed on a command line)
//! and are converted into [`Converted`] values of the exact native width the
//! ABI parameter declares. Decoded return values go the other way through
//! [`convert_output`].

use serde_json::Value;
use web3_primitives::{is_hex_address, Address, H256, U256};

use super::json::Param;
use super::types::{I256, ParamType, Token};
use crate::SdkError;

const FLOAT_ERROR: &str =
    "floating point numbers are not valid in web3 - please use an integer or string instead";

/// A call argument converted to the native representation of its ABI type
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Converted {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Unsigned widths above 64 bits
    BigUint(U256),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    /// Signed widths above 64 bits
    BigInt(I256),
    Bool(bool),
    String(String),
    Address(Address),
    Bytes(Vec<u8>),
    FixedBytes(Vec<u8>),
    Hash(H256),
    /// Elements of an array or slice argument
    List(Vec<Converted>),
}

impl From<Converted> for Token {
    fn from(value: Converted) -> Self {
        match value {
            Converted::U8(v) => Token::Uint(U256::from(v)),
            Converted::U16(v) => Token::Uint(U256::from(v)),
            Converted::U32(v) => Token::Uint(U256::from(v)),
            Converted::U64(v) => Token::Uint(U256::from(v)),
            Converted::BigUint(v) => Token::Uint(v),
            Converted::I8(v) => Token::Int(I256::from_i128(v.into())),
            Converted::I16(v) => Token::Int(I256::from_i128(v.into())),
            Converted::I32(v) => Token::Int(I256::from_i128(v.into())),
            Converted::I64(v) => Token::Int(I256::from_i128(v.into())),
            Converted::BigInt(v) => Token::Int(v),
            Converted::Bool(v) => Token::Bool(v),
            Converted::String(v) => Token::String(v),
            Converted::Address(v) => Token::Address(v),
            Converted::Bytes(v) => Token::Bytes(v),
            Converted::FixedBytes(v) => Token::FixedBytes(v),
            Converted::Hash(v) => Token::bytes32(v),
            Converted::List(items) => Token::Array(items.into_iter().map(Token::from).collect()),
        }
    }
}

/// Convert positional arguments for a function's inputs into ABI tokens
pub fn convert_arguments(inputs: &[Param], params: &[Value]) -> Result<Vec<Token>, SdkError> {
    if inputs.len() != params.len() {
        return Err(SdkError::Convert(format!(
            "wrong number of arguments expected {} got {}",
            inputs.len(),
            params.len()
        )));
    }
    inputs
        .iter()
        .zip(params)
        .map(|(input, param)| convert_argument(&input.kind, param).map(Token::from))
        .collect()
}

/// Convert a single argument to the native value for `ty`
pub fn convert_argument(ty: &ParamType, value: &Value) -> Result<Converted, SdkError> {
    match ty {
        ParamType::Bool => convert_bool(value),
        ParamType::Uint(bits) => convert_int(false, *bits, parse_integer(value)?),
        ParamType::Int(bits) => convert_int(true, *bits, parse_integer(value)?),
        ParamType::Address => match value {
            Value::String(s) if is_hex_address(s) => Address::from_hex(s)
                .map(Converted::Address)
                .map_err(|_| SdkError::Convert(format!("invalid hex address: {}", s))),
            other => Err(SdkError::Convert(format!("invalid hex address: {}", display(other)))),
        },
        ParamType::String => match value {
            Value::String(s) => Ok(Converted::String(s.clone())),
            _ => Err(unsupported(ty)),
        },
        ParamType::Bytes => decode_hex_arg(value, "bytes").map(Converted::Bytes),
        ParamType::Hash | ParamType::FixedBytes(32) => {
            let bytes = decode_hex_arg(value, "hash")?;
            if bytes.len() != 32 {
                return Err(SdkError::Convert(format!(
                    "invalid hash length {}:hash must be 32 bytes",
                    bytes.len()
                )));
            }
            if *ty == ParamType::Hash {
                Ok(Converted::Hash(H256::from_slice(&bytes)?))
            } else {
                Ok(Converted::FixedBytes(bytes))
            }
        }
        ParamType::FixedBytes(size) => {
            let bytes = decode_hex_arg(value, "bytes")?;
            if bytes.len() != *size {
                return Err(SdkError::Convert(format!(
                    "invalid byte array length {}: size is {} bytes",
                    bytes.len(),
                    size
                )));
            }
            Ok(Converted::FixedBytes(bytes))
        }
        ParamType::Array(inner) => convert_list(inner, value).map(Converted::List),
        ParamType::FixedArray(inner, size) => {
            let items = convert_list(inner, value)?;
            if items.len() != *size {
                return Err(SdkError::Convert(format!(
                    "invalid array length {}: size is {} elements",
                    items.len(),
                    size
                )));
            }
            Ok(Converted::List(items))
        }
        ParamType::Tuple(_) => Err(unsupported(ty)),
    }
}

/// Range-check an integer and narrow it to the smallest native width covering `bits`.
pub fn convert_int(signed: bool, bits: usize, value: I256) -> Result<Converted, SdkError> {
    if signed {
        if !value.fits_signed(bits) {
            return Err(SdkError::Convert(format!("integer overflows int{}: {}", bits, value)));
        }
        let narrow = value.to_i64();
        return Ok(match (bits, narrow) {
            (..=8, Some(v)) => Converted::I8(v as i8),
            (..=16, Some(v)) => Converted::I16(v as i16),
            (..=32, Some(v)) => Converted::I32(v as i32),
            (..=64, Some(v)) => Converted::I64(v),
            _ => Converted::BigInt(value),
        });
    }

    if value.negative {
        return Err(SdkError::Convert(format!("negative value in unsigned field: {}", value)));
    }
    if !value.fits_unsigned(bits) {
        return Err(SdkError::Convert(format!("integer overflows uint{}: {}", bits, value)));
    }
    let v = value.abs;
    Ok(match bits {
        ..=8 => Converted::U8(v.low_u64() as u8),
        ..=16 => Converted::U16(v.low_u64() as u16),
        ..=32 => Converted::U32(v.low_u64() as u32),
        ..=64 => Converted::U64(v.low_u64()),
        _ => Converted::BigUint(v),
    })
}

/// Parse an integer literal: optional sign, then decimal or `0x`/`0o`/`0b` digits.
pub fn parse_int_literal(s: &str) -> Result<I256, SdkError> {
    let err = || SdkError::Convert(format!("failed to parse big.Int: {}", s));

    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let lower = body.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        (10, lower.as_str())
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(err());
    }
    let abs = if radix == 10 {
        U256::from_dec_str(digits).map_err(|_| err())?
    } else {
        U256::from_str_radix(digits, radix).map_err(|_| err())?
    };
    Ok(I256::new(abs, negative))
}

/// Map a decoded token back to a JSON-friendly value
pub fn convert_output(ty: &ParamType, token: &Token) -> Result<Value, SdkError> {
    let value = match (ty, token) {
        (ParamType::Bool, Token::Bool(b)) => Value::Bool(*b),
        (ParamType::String, Token::String(s)) => Value::String(s.clone()),
        (ParamType::Address, Token::Address(a)) => Value::String(a.to_checksum()),
        (ParamType::Uint(bits), Token::Uint(v)) if *bits <= 64 => Value::from(v.low_u64()),
        (ParamType::Uint(_), Token::Uint(v)) => Value::String(v.to_string()),
        (ParamType::Int(bits), Token::Int(v)) if *bits <= 64 => match v.to_i64() {
            Some(n) => Value::from(n),
            None => Value::String(v.to_string()),
        },
        (ParamType::Int(_), Token::Int(v)) => Value::String(v.to_string()),
        (ParamType::Bytes, Token::Bytes(b)) => Value::String(format!("0x{}", hex::encode(b))),
        (ParamType::Hash, Token::FixedBytes(b)) => Value::String(format!("0x{}", hex::encode(b))),
        (ParamType::FixedBytes(32), Token::FixedBytes(b)) => {
            Value::String(format!("0x{}", hex::encode(b)))
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(_)) => {
            return Err(SdkError::Convert(format!(
                "unsupported output byte array size {}",
                size
            )))
        }
        (
            ParamType::Array(inner) | ParamType::FixedArray(inner, _),
            Token::Array(items) | Token::FixedArray(items),
        ) => Value::Array(
            items
                .iter()
                .map(|item| convert_output(inner, item))
                .collect::<Result<_, _>>()?,
        ),
        (ParamType::Tuple(types), Token::Tuple(items)) => Value::Array(convert_outputs(types, items)?),
        _ => {
            return Err(SdkError::Convert(format!(
                "cannot convert {:?} as output type {}",
                token, ty
            )))
        }
    };
    Ok(value)
}

/// Map a list of decoded tokens back to JSON values
pub fn convert_outputs(types: &[ParamType], tokens: &[Token]) -> Result<Vec<Value>, SdkError> {
    if types.len() != tokens.len() {
        return Err(SdkError::AbiDecode(format!(
            "expected {} values, got {}",
            types.len(),
            tokens.len()
        )));
    }
    types
        .iter()
        .zip(tokens)
        .map(|(ty, token)| convert_output(ty, token))
        .collect()
}

fn convert_bool(value: &Value) -> Result<Converted, SdkError> {
    match value {
        Value::Bool(b) => Ok(Converted::Bool(*b)),
        Value::String(s) => match s.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(Converted::Bool(true)),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(Converted::Bool(false)),
            _ => Err(SdkError::Convert(format!("failed to parse bool {:?}", s))),
        },
        other => Err(SdkError::Convert(format!("failed to parse bool {:?}", display(other)))),
    }
}

fn parse_integer(value: &Value) -> Result<I256, SdkError> {
    match value {
        Value::String(s) => parse_int_literal(s.trim()),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(I256::new(U256::from(v), false))
            } else if let Some(v) = n.as_i64() {
                Ok(I256::from_i128(v.into()))
            } else {
                Err(SdkError::Convert(FLOAT_ERROR.to_string()))
            }
        }
        other => Err(SdkError::Convert(format!("failed to parse big.Int: {}", display(other)))),
    }
}

fn decode_hex_arg(value: &Value, what: &str) -> Result<Vec<u8>, SdkError> {
    let s = match value {
        Value::String(s) => s,
        other => return Err(SdkError::Convert(format!("failed to parse {} {:?}", what, display(other)))),
    };
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .and_then(|h| hex::decode(h).ok())
        .ok_or_else(|| SdkError::Convert(format!("failed to parse {} {:?}", what, s)))
}

fn convert_list(inner: &ParamType, value: &Value) -> Result<Vec<Converted>, SdkError> {
    match inner {
        ParamType::Address | ParamType::String | ParamType::Bool | ParamType::Uint(_) | ParamType::Int(_) => {}
        other => return Err(unsupported(other)),
    }

    let items: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => {
            let body = s.trim().trim_start_matches('[').trim_end_matches(']').trim();
            if body.is_empty() {
                Vec::new()
            } else {
                body.split(',').map(|item| Value::String(item.trim().to_string())).collect()
            }
        }
        _ => return Err(unsupported(&ParamType::Array(Box::new(inner.clone())))),
    };

    items.iter().map(|item| convert_argument(inner, item)).collect()
}

fn unsupported(ty: &ParamType) -> SdkError {
    SdkError::Convert(format!("unsupported input type {}", ty))
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn err_of(ty: ParamType, value: Value) -> String {
        convert_argument(&ty, &value).unwrap_err().to_string()
    }

    // ==================== Booleans ====================

    #[test]
    fn test_convert_bool() {
        for s in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(convert_argument(&ParamType::Bool, &json!(s)).unwrap(), Converted::Bool(true));
        }
        for s in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(convert_argument(&ParamType::Bool, &json!(s)).unwrap(), Converted::Bool(false));
        }
        assert_eq!(convert_argument(&ParamType::Bool, &json!(true)).unwrap(), Converted::Bool(true));
        assert_eq!(err_of(ParamType::Bool, json!("yes")), r#"failed to parse bool "yes""#);
    }

    // ==================== Integers ====================

    #[test]
    fn test_convert_uint_widths() {
        assert_eq!(convert_argument(&ParamType::Uint(8), &json!("255")).unwrap(), Converted::U8(255));
        assert_eq!(convert_argument(&ParamType::Uint(16), &json!("0x10")).unwrap(), Converted::U16(16));
        assert_eq!(convert_argument(&ParamType::Uint(32), &json!(7)).unwrap(), Converted::U32(7));
        assert_eq!(
            convert_argument(&ParamType::Uint(64), &json!("18446744073709551615")).unwrap(),
            Converted::U64(u64::MAX)
        );
        assert_eq!(
            convert_argument(&ParamType::Uint(256), &json!("1000000000000000000000")).unwrap(),
            Converted::BigUint(U256::exp10(21))
        );
    }

    #[test]
    fn test_convert_int_widths() {
        assert_eq!(convert_argument(&ParamType::Int(8), &json!("-128")).unwrap(), Converted::I8(-128));
        assert_eq!(convert_argument(&ParamType::Int(64), &json!(-5)).unwrap(), Converted::I64(-5));
        assert_eq!(
            convert_argument(&ParamType::Int(256), &json!("-0x10")).unwrap(),
            Converted::BigInt(I256::from_i128(-16))
        );
    }

    #[test]
    fn test_convert_odd_widths_use_smallest_native() {
        assert_eq!(convert_argument(&ParamType::Uint(24), &json!("5")).unwrap(), Converted::U32(5));
        assert_eq!(convert_argument(&ParamType::Uint(48), &json!("7")).unwrap(), Converted::U64(7));
        assert_eq!(convert_argument(&ParamType::Uint(72), &json!("9")).unwrap(), Converted::BigUint(U256::from(9)));
        assert_eq!(convert_argument(&ParamType::Int(40), &json!("-5")).unwrap(), Converted::I64(-5));
        assert_eq!(convert_argument(&ParamType::Int(24), &json!(-8388608)).unwrap(), Converted::I32(-8388608));
        assert_eq!(convert_argument(&ParamType::Int(136), &json!("-1")).unwrap(), Converted::BigInt(I256::from_i128(-1)));

        // the declared width still bounds the value
        assert_eq!(err_of(ParamType::Uint(24), json!("16777216")), "integer overflows uint24: 16777216");
        assert_eq!(err_of(ParamType::Int(40), json!("549755813888")), "integer overflows int40: 549755813888");
    }

    #[test]
    fn test_convert_int_errors() {
        assert_eq!(err_of(ParamType::Uint(8), json!("256")), "integer overflows uint8: 256");
        assert_eq!(err_of(ParamType::Int(8), json!("128")), "integer overflows int8: 128");
        assert_eq!(err_of(ParamType::Int(8), json!("-129")), "integer overflows int8: -129");
        assert_eq!(err_of(ParamType::Uint(64), json!("-1")), "negative value in unsigned field: -1");
        assert_eq!(err_of(ParamType::Uint(256), json!("-1")), "negative value in unsigned field: -1");
        assert_eq!(err_of(ParamType::Uint(256), json!(1.5)), FLOAT_ERROR);
        assert_eq!(err_of(ParamType::Uint(256), json!("abc")), "failed to parse big.Int: abc");
        assert!(err_of(ParamType::Uint(256), json!(format!("0x1{}", "0".repeat(64)))).starts_with("failed to parse"));
    }

    #[test]
    fn test_parse_int_literal() {
        assert_eq!(parse_int_literal("0b101").unwrap(), I256::from_i128(5));
        assert_eq!(parse_int_literal("0o17").unwrap(), I256::from_i128(15));
        assert_eq!(parse_int_literal("+42").unwrap(), I256::from_i128(42));
        assert!(parse_int_literal("").is_err());
        assert!(parse_int_literal("0x").is_err());
        assert!(parse_int_literal("1_000").is_err());
    }

    // ==================== Addresses and bytes ====================

    #[test]
    fn test_convert_address() {
        let s = "0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d";
        assert_eq!(
            convert_argument(&ParamType::Address, &json!(s)).unwrap(),
            Converted::Address(Address::from_hex(s).unwrap())
        );
        assert_eq!(err_of(ParamType::Address, json!("0x1234")), "invalid hex address: 0x1234");
    }

    #[test]
    fn test_convert_bytes() {
        assert_eq!(
            convert_argument(&ParamType::Bytes, &json!("0x0102")).unwrap(),
            Converted::Bytes(vec![1, 2])
        );
        assert_eq!(err_of(ParamType::Bytes, json!("0102")), r#"failed to parse bytes "0102""#);

        let hash = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            convert_argument(&ParamType::Hash, &json!(hash)).unwrap(),
            Converted::Hash(H256::from_bytes([0xab; 32]))
        );
        assert_eq!(
            err_of(ParamType::FixedBytes(32), json!("0x01")),
            "invalid hash length 1:hash must be 32 bytes"
        );
        assert_eq!(
            err_of(ParamType::FixedBytes(4), json!("0x0102")),
            "invalid byte array length 2: size is 4 bytes"
        );
        assert_eq!(
            convert_argument(&ParamType::FixedBytes(2), &json!("0x0102")).unwrap(),
            Converted::FixedBytes(vec![1, 2])
        );
    }

    // ==================== Arrays ====================

    #[test]
    fn test_convert_array_from_string() {
        let ty = ParamType::Array(Box::new(ParamType::Uint(8)));
        assert_eq!(
            convert_argument(&ty, &json!("[1, 2,3]")).unwrap(),
            Converted::List(vec![Converted::U8(1), Converted::U8(2), Converted::U8(3)])
        );
        assert_eq!(convert_argument(&ty, &json!("[]")).unwrap(), Converted::List(vec![]));
        assert_eq!(
            convert_argument(&ty, &json!([4, "5"])).unwrap(),
            Converted::List(vec![Converted::U8(4), Converted::U8(5)])
        );
    }

    #[test]
    fn test_convert_fixed_array_checks_length() {
        let ty = ParamType::FixedArray(Box::new(ParamType::Bool), 2);
        assert!(convert_argument(&ty, &json!("[true,false]")).is_ok());
        assert_eq!(
            err_of(ty, json!("[true]")),
            "invalid array length 1: size is 2 elements"
        );
    }

    #[test]
    fn test_convert_array_unsupported_element() {
        let ty = ParamType::Array(Box::new(ParamType::FixedBytes(32)));
        assert!(err_of(ty, json!("[0x01]")).starts_with("unsupported input type"));
        let nested = ParamType::Array(Box::new(ParamType::Array(Box::new(ParamType::Uint(8)))));
        assert!(err_of(nested, json!("[[1]]")).starts_with("unsupported input type"));
    }

    #[test]
    fn test_convert_arguments_count_mismatch() {
        let inputs = vec![Param {
            name: "to".into(),
            kind: ParamType::Address,
            indexed: false,
        }];
        let err = convert_arguments(&inputs, &[]).unwrap_err();
        assert_eq!(err.to_string(), "wrong number of arguments expected 1 got 0");
    }

    // ==================== Outputs ====================

    #[test]
    fn test_convert_output() {
        assert_eq!(convert_output(&ParamType::Uint(8), &Token::Uint(U256::from(3))).unwrap(), json!(3));
        assert_eq!(
            convert_output(&ParamType::Uint(256), &Token::Uint(U256::exp10(20))).unwrap(),
            json!("100000000000000000000")
        );
        assert_eq!(
            convert_output(&ParamType::Int(64), &Token::Int(I256::from_i128(-3))).unwrap(),
            json!(-3)
        );
        assert_eq!(
            convert_output(&ParamType::FixedBytes(32), &Token::FixedBytes(vec![0; 32])).unwrap(),
            json!(format!("0x{}", "00".repeat(32)))
        );
        assert_eq!(
            convert_output(&ParamType::FixedBytes(4), &Token::FixedBytes(vec![0; 4]))
                .unwrap_err()
                .to_string(),
            "unsupported output byte array size 4"
        );
        assert_eq!(
            convert_output(
                &ParamType::Array(Box::new(ParamType::Bool)),
                &Token::Array(vec![Token::Bool(true)])
            )
            .unwrap(),
            json!([true])
        );
    }
}
