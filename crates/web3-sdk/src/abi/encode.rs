//! ABI encoding

use web3_primitives::{H256, U256};

use super::types::{ParamType, Token};
use crate::SdkError;

/// Encode tokens, inferring each parameter type from its token
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let types: Vec<ParamType> = tokens.iter().map(|t| t.type_of()).collect();
    // Inferred types always match their tokens.
    encode_params(&types, tokens).unwrap_or_default()
}

/// Encode function call (selector + params)
pub fn encode_function_call(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
    let mut result = selector.to_vec();
    result.extend(encode(tokens));
    result
}

/// Encode tokens against declared parameter types
pub fn encode_params(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, SdkError> {
    if types.len() != tokens.len() {
        return Err(SdkError::AbiEncode(format!(
            "expected {} values, got {}",
            types.len(),
            tokens.len()
        )));
    }

    let head_size = types
        .iter()
        .map(ParamType::head_length)
        .fold(0, usize::saturating_add);

    // Sized from the tokens; declared array sizes are not trusted until checked.
    let mut head = Vec::with_capacity(32 * tokens.len());
    let mut tail = Vec::new();

    for (param_type, token) in types.iter().zip(tokens.iter()) {
        if param_type.is_dynamic() {
            let offset = head_size + tail.len();
            head.extend(encode_u256(&U256::from(offset)));
            tail.extend(encode_token(param_type, token)?);
        } else {
            head.extend(encode_token(param_type, token)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

/// Encode a single token
fn encode_token(param_type: &ParamType, token: &Token) -> Result<Vec<u8>, SdkError> {
    let encoded = match (param_type, token) {
        (ParamType::Address, Token::Address(addr)) => {
            let mut buf = [0u8; 32];
            buf[12..32].copy_from_slice(addr.as_bytes());
            buf.to_vec()
        }
        (ParamType::Uint(_), Token::Uint(value)) => encode_u256(value),
        (ParamType::Int(_), Token::Int(value)) => encode_u256(&value.to_twos_complement()),
        (ParamType::Bool, Token::Bool(b)) => {
            let mut buf = [0u8; 32];
            buf[31] = u8::from(*b);
            buf.to_vec()
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(data)) => {
            if data.len() > *size {
                return Err(SdkError::AbiEncode(format!(
                    "{} bytes do not fit bytes{}",
                    data.len(),
                    size
                )));
            }
            let mut buf = [0u8; 32];
            buf[..data.len()].copy_from_slice(data);
            buf.to_vec()
        }
        (ParamType::Hash, Token::FixedBytes(data)) if data.len() == 32 => data.clone(),
        (ParamType::Bytes, Token::Bytes(data)) => encode_bytes(data),
        (ParamType::String, Token::String(s)) => encode_bytes(s.as_bytes()),
        (ParamType::Array(inner), Token::Array(tokens) | Token::FixedArray(tokens)) => {
            let mut result = encode_u256(&U256::from(tokens.len()));
            let inner_types = vec![(**inner).clone(); tokens.len()];
            result.extend(encode_params(&inner_types, tokens)?);
            result
        }
        (ParamType::FixedArray(inner, size), Token::FixedArray(tokens) | Token::Array(tokens)) => {
            if tokens.len() != *size {
                return Err(SdkError::AbiEncode(format!(
                    "array of {} elements does not fit {}",
                    tokens.len(),
                    param_type
                )));
            }
            let inner_types = vec![(**inner).clone(); *size];
            encode_params(&inner_types, tokens)?
        }
        (ParamType::Tuple(types), Token::Tuple(tokens)) => encode_params(types, tokens)?,
        _ => {
            return Err(SdkError::AbiEncode(format!(
                "cannot use {:?} as type {}",
                token, param_type
            )))
        }
    };
    Ok(encoded)
}

/// Convert U256 to 32-byte big-endian array
fn u256_to_bytes(value: &U256) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    bytes
}

/// Encode a U256 as 32 bytes
fn encode_u256(value: &U256) -> Vec<u8> {
    u256_to_bytes(value).to_vec()
}

/// Encode dynamic bytes
fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut result = encode_u256(&U256::from(data.len()));

    // Pad to 32 bytes
    let padded_len = data.len().div_ceil(32) * 32;
    let mut padded = vec![0u8; padded_len];
    padded[..data.len()].copy_from_slice(data);
    result.extend(padded);

    result
}

/// Compute function selector (first 4 bytes of keccak256(signature))
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = web3_crypto::keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.as_bytes()[..4]);
    selector
}

/// Compute an event's topic (keccak256 of its signature)
pub fn event_topic(signature: &str) -> H256 {
    web3_crypto::keccak256(signature.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::I256;
    use web3_primitives::Address;

    #[test]
    fn test_encode_address() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let encoded = encode(&[Token::Address(addr)]);

        assert_eq!(encoded.len(), 32);
        assert_eq!(&encoded[12..32], addr.as_bytes());
    }

    #[test]
    fn test_encode_negative_int() {
        let encoded = encode_params(&[ParamType::Int(8)], &[Token::Int(I256::from_i128(-1))]).unwrap();
        assert_eq!(encoded, vec![0xff; 32]);

        let encoded = encode_params(&[ParamType::Int(256)], &[Token::Int(I256::from_i128(-2))]).unwrap();
        assert_eq!(encoded[31], 0xfe);
        assert!(encoded[..31].iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_encode_bool() {
        assert_eq!(encode(&[Token::Bool(true)])[31], 1);
        assert_eq!(encode(&[Token::Bool(false)])[31], 0);
    }

    #[test]
    fn test_encode_short_fixed_bytes_right_padded() {
        let encoded = encode_params(&[ParamType::FixedBytes(4)], &[Token::FixedBytes(vec![1, 2, 3, 4])]).unwrap();
        assert_eq!(&encoded[..4], &[1, 2, 3, 4]);
        assert!(encoded[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_hash_as_bytes32() {
        let data = [0x42u8; 32];
        let encoded = encode_params(&[ParamType::Hash], &[Token::FixedBytes(data.to_vec())]).unwrap();
        assert_eq!(&encoded[..], &data[..]);
    }

    #[test]
    fn test_encode_dynamic_bytes() {
        let data = vec![0x01, 0x02, 0x03];
        let encoded = encode(&[Token::Bytes(data.clone())]);

        // offset + length + padded data
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 32);
        assert_eq!(encoded[63], 3);
        assert_eq!(&encoded[64..67], &data[..]);
    }

    #[test]
    fn test_encode_string_array() {
        // f(string[]) with ["a", "b"]
        let types = [ParamType::Array(Box::new(ParamType::String))];
        let tokens = [Token::Array(vec![
            Token::String("a".into()),
            Token::String("b".into()),
        ])];
        let encoded = encode_params(&types, &tokens).unwrap();

        let words: Vec<U256> = encoded.chunks(32).map(U256::from_big_endian).collect();
        assert_eq!(words[0], U256::from(32)); // offset of array
        assert_eq!(words[1], U256::from(2)); // length
        assert_eq!(words[2], U256::from(64)); // offset of "a" relative to element heads
        assert_eq!(words[3], U256::from(128)); // offset of "b"
        assert_eq!(words[4], U256::from(1));
        assert_eq!(words[6], U256::from(1));
        assert_eq!(encoded.len(), 32 * 8);
    }

    #[test]
    fn test_encode_mismatch_is_error() {
        assert!(encode_params(&[ParamType::Bool], &[Token::Uint(U256::one())]).is_err());
        assert!(encode_params(&[ParamType::Bool], &[]).is_err());
        assert!(encode_params(
            &[ParamType::FixedArray(Box::new(ParamType::Bool), 2)],
            &[Token::FixedArray(vec![Token::Bool(true)])]
        )
        .is_err());
    }

    #[test]
    fn test_function_selector() {
        assert_eq!(function_selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(function_selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_event_topic() {
        assert_eq!(
            event_topic("Transfer(address,address,uint256)").to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_encode_function_call() {
        let to = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let selector = function_selector("transfer(address,uint256)");
        let encoded = encode_function_call(selector, &[Token::Address(to), Token::Uint(U256::from(1000))]);

        assert_eq!(encoded.len(), 68);
        assert_eq!(&encoded[..4], &selector);
    }
}
