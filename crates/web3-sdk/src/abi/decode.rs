//! ABI decoding

use web3_primitives::{Address, U256};

use super::types::{I256, ParamType, Token};
use crate::SdkError;

/// Decode tokens from ABI-encoded data
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    decode_tuple(types, data)
}

/// Decode function return data
pub fn decode_output(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    if types.is_empty() {
        return Ok(Vec::new());
    }
    decode(types, data)
}

/// Decode a sequence of values whose dynamic offsets are relative to `data[0]`.
fn decode_tuple(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, SdkError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut head = 0usize;

    for param_type in types {
        let token = if param_type.is_dynamic() {
            let offset = read_usize(data, head)?;
            let tail = data.get(offset..).ok_or_else(|| out_of_bounds(offset, data.len()))?;
            decode_value(param_type, tail)?
        } else {
            let inline = data.get(head..).ok_or_else(|| out_of_bounds(head, data.len()))?;
            decode_value(param_type, inline)?
        };
        tokens.push(token);
        head = head.saturating_add(param_type.head_length());
    }

    Ok(tokens)
}

/// Decode one value whose encoding starts at `data[0]`
fn decode_value(param_type: &ParamType, data: &[u8]) -> Result<Token, SdkError> {
    match param_type {
        ParamType::Address => {
            let word = read_word(data, 0)?;
            Ok(Token::Address(Address::from_word(word)))
        }
        ParamType::Uint(_) => Ok(Token::Uint(U256::from_big_endian(read_word(data, 0)?))),
        ParamType::Int(_) => {
            let word = U256::from_big_endian(read_word(data, 0)?);
            Ok(Token::Int(I256::from_twos_complement(word)))
        }
        ParamType::Bool => {
            let word = read_word(data, 0)?;
            if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                return Err(SdkError::AbiDecode("improperly encoded boolean value".to_string()));
            }
            Ok(Token::Bool(word[31] == 1))
        }
        ParamType::FixedBytes(size) => {
            let word = read_word(data, 0)?;
            let size = (*size).min(32);
            Ok(Token::FixedBytes(word[..size].to_vec()))
        }
        ParamType::Hash => Ok(Token::FixedBytes(read_word(data, 0)?.to_vec())),
        ParamType::Bytes => Ok(Token::Bytes(decode_bytes(data)?)),
        ParamType::String => {
            let bytes = decode_bytes(data)?;
            let s = String::from_utf8(bytes)
                .map_err(|e| SdkError::AbiDecode(format!("invalid UTF-8: {}", e)))?;
            Ok(Token::String(s))
        }
        ParamType::Array(inner) => {
            let len = read_usize(data, 0)?;
            let body = &data[32..];
            // Every element needs at least its head; reject lengths the data cannot hold.
            if len.saturating_mul(inner.head_length()) > body.len() {
                return Err(SdkError::AbiDecode(format!(
                    "array length {} exceeds available data",
                    len
                )));
            }
            let inner_types = vec![(**inner).clone(); len];
            Ok(Token::Array(decode_tuple(&inner_types, body)?))
        }
        ParamType::FixedArray(inner, size) => {
            if size.saturating_mul(inner.head_length()) > data.len() {
                return Err(SdkError::AbiDecode(format!(
                    "fixed array length {} exceeds available data",
                    size
                )));
            }
            let inner_types = vec![(**inner).clone(); *size];
            Ok(Token::FixedArray(decode_tuple(&inner_types, data)?))
        }
        ParamType::Tuple(types) => Ok(Token::Tuple(decode_tuple(types, data)?)),
    }
}

/// Decode length-prefixed bytes
fn decode_bytes(data: &[u8]) -> Result<Vec<u8>, SdkError> {
    let len = read_usize(data, 0)?;
    let end = 32usize
        .checked_add(len)
        .ok_or_else(|| out_of_bounds(usize::MAX, data.len()))?;
    check_length(data, end)?;
    Ok(data[32..end].to_vec())
}

fn read_word(data: &[u8], offset: usize) -> Result<&[u8; 32], SdkError> {
    check_length(data, offset + 32)?;
    let word: &[u8; 32] = data[offset..offset + 32]
        .try_into()
        .map_err(|_| out_of_bounds(offset + 32, data.len()))?;
    Ok(word)
}

/// Read a word used as an offset or length
fn read_usize(data: &[u8], offset: usize) -> Result<usize, SdkError> {
    let value = U256::from_big_endian(read_word(data, offset)?);
    if value > U256::from(data.len()) {
        return Err(SdkError::AbiDecode(format!(
            "offset or length {} exceeds data size {}",
            value,
            data.len()
        )));
    }
    Ok(value.as_usize())
}

/// Check that data has at least `required` bytes
fn check_length(data: &[u8], required: usize) -> Result<(), SdkError> {
    if data.len() < required {
        return Err(out_of_bounds(required, data.len()));
    }
    Ok(())
}

fn out_of_bounds(required: usize, have: usize) -> SdkError {
    SdkError::AbiDecode(format!(
        "insufficient data: need {} bytes, have {}",
        required, have
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode_params;

    fn word(n: u64) -> [u8; 32] {
        let mut buf = [0u8; 32];
        U256::from(n).to_big_endian(&mut buf);
        buf
    }

    // ==================== Static types ====================

    #[test]
    fn test_decode_address() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let mut encoded = [0u8; 32];
        encoded[12..32].copy_from_slice(addr.as_bytes());

        let tokens = decode(&[ParamType::Address], &encoded).unwrap();
        assert_eq!(tokens, vec![Token::Address(addr)]);
    }

    #[test]
    fn test_decode_uint_and_negative_int() {
        let mut encoded = word(100).to_vec();
        encoded.extend([0xffu8; 32]);

        let tokens = decode(&[ParamType::Uint(256), ParamType::Int(8)], &encoded).unwrap();
        assert_eq!(tokens[0], Token::Uint(U256::from(100)));
        assert_eq!(tokens[1], Token::Int(I256::from_i128(-1)));
    }

    #[test]
    fn test_decode_bool_strict() {
        assert_eq!(decode(&[ParamType::Bool], &word(1)).unwrap()[0], Token::Bool(true));
        assert_eq!(decode(&[ParamType::Bool], &word(0)).unwrap()[0], Token::Bool(false));
        assert!(decode(&[ParamType::Bool], &word(2)).is_err());
    }

    #[test]
    fn test_decode_fixed_bytes() {
        let data = [0x42u8; 32];
        let tokens = decode(&[ParamType::FixedBytes(32)], &data).unwrap();
        assert_eq!(tokens[0], Token::FixedBytes(data.to_vec()));

        let tokens = decode(&[ParamType::FixedBytes(2)], &data).unwrap();
        assert_eq!(tokens[0], Token::FixedBytes(vec![0x42, 0x42]));
    }

    // ==================== Dynamic types ====================

    #[test]
    fn test_decode_string() {
        let mut encoded = word(32).to_vec();
        encoded.extend(word(5));
        let mut body = [0u8; 32];
        body[..5].copy_from_slice(b"hello");
        encoded.extend(body);

        let tokens = decode(&[ParamType::String], &encoded).unwrap();
        assert_eq!(tokens[0], Token::String("hello".to_string()));
    }

    #[test]
    fn test_decode_nested_dynamic_offsets() {
        let types = vec![
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::String)),
            ParamType::Tuple(vec![ParamType::Bool, ParamType::Bytes]),
            ParamType::FixedArray(Box::new(ParamType::Address), 2),
        ];
        let tokens = vec![
            Token::Uint(U256::from(7)),
            Token::Array(vec![
                Token::String("one".into()),
                Token::String("a much longer string that spans more than one word".into()),
            ]),
            Token::Tuple(vec![Token::Bool(true), Token::Bytes(vec![9, 8, 7])]),
            Token::FixedArray(vec![
                Token::Address(Address::from_bytes([1u8; 20])),
                Token::Address(Address::from_bytes([2u8; 20])),
            ]),
        ];

        let encoded = encode_params(&types, &tokens).unwrap();
        assert_eq!(decode(&types, &encoded).unwrap(), tokens);
    }

    // ==================== Malformed input ====================

    #[test]
    fn test_decode_truncated() {
        assert!(decode(&[ParamType::Uint(256)], &[0u8; 31]).is_err());
        assert!(decode(&[ParamType::Address, ParamType::Uint(256)], &[0u8; 32]).is_err());
    }

    #[test]
    fn test_decode_bad_offset() {
        let encoded = word(4096);
        assert!(decode(&[ParamType::Bytes], &encoded).is_err());
    }

    #[test]
    fn test_decode_huge_array_length_rejected() {
        let mut encoded = word(32).to_vec();
        encoded.extend([0xffu8; 32]);
        assert!(decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], &encoded).is_err());

        let mut encoded = word(32).to_vec();
        encoded.extend(word(10));
        encoded.extend(word(1));
        assert!(decode(&[ParamType::Array(Box::new(ParamType::Uint(256)))], &encoded).is_err());
    }

    #[test]
    fn test_decode_huge_fixed_array_rejected() {
        let ty = ParamType::FixedArray(Box::new(ParamType::Uint(256)), 1 << 40);
        let err = decode(&[ty], &[0u8; 32]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to unpack values: fixed array length 1099511627776 exceeds available data"
        );

        let nested = ParamType::FixedArray(
            Box::new(ParamType::FixedArray(Box::new(ParamType::Bool), usize::MAX)),
            usize::MAX,
        );
        assert!(decode(&[nested.clone()], &[0u8; 64]).is_err());
        assert!(decode(&[ParamType::Bool, nested], &[0u8; 64]).is_err());
    }

    #[test]
    fn test_decode_fixed_array_from_abi_json() {
        let abi = crate::abi::Abi::from_json(
            r#"[{"type":"function","name":"f","inputs":[],"outputs":[{"name":"","type":"uint256[1099511627776]"}]}]"#,
        )
        .unwrap();
        let outputs: Vec<ParamType> = abi.function("f").unwrap().outputs.iter().map(|p| p.kind.clone()).collect();
        assert!(decode_output(&outputs, &[0u8; 64]).is_err());

        let small = ParamType::FixedArray(Box::new(ParamType::Uint(256)), 2);
        let mut encoded = word(7).to_vec();
        encoded.extend(word(9));
        assert_eq!(
            decode(&[small], &encoded).unwrap(),
            vec![Token::FixedArray(vec![Token::Uint(U256::from(7)), Token::Uint(U256::from(9))])]
        );
    }

    #[test]
    fn test_decode_output_empty() {
        assert!(decode_output(&[], &[]).unwrap().is_empty());
    }
}
