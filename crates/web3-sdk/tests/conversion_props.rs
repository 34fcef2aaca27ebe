//! Property tests for argument conversion and amount parsing

use proptest::prelude::*;
use serde_json::{json, Value};
use web3_sdk::abi::{convert_argument, Converted, ParamType};
use web3_sdk::units::{format_units, parse_amount, parse_base, parse_units, wei_as_base};
use web3_sdk::U256;

fn expected_unsigned(bits: usize, v: u64) -> Converted {
    match bits {
        ..=8 => Converted::U8(v as u8),
        ..=16 => Converted::U16(v as u16),
        ..=32 => Converted::U32(v as u32),
        _ => Converted::U64(v),
    }
}

fn expected_signed(bits: usize, v: i64) -> Converted {
    match bits {
        ..=8 => Converted::I8(v as i8),
        ..=16 => Converted::I16(v as i16),
        ..=32 => Converted::I32(v as i32),
        _ => Converted::I64(v),
    }
}

/// Every ABI integer width up to 64 bits, including 24, 40, 48 and 56
fn native_width() -> impl Strategy<Value = usize> {
    (1usize..=8).prop_map(|n| n * 8)
}

proptest! {
    // ==================== Integer Conversion ====================

    #[test]
    fn unsigned_in_range_converts_to_native_width(bits in native_width(), raw in any::<u64>()) {
        let v = if bits == 64 { raw } else { raw % (1u64 << bits) };
        let ty = ParamType::Uint(bits);

        let from_decimal = convert_argument(&ty, &json!(v.to_string())).unwrap();
        let from_hex = convert_argument(&ty, &json!(format!("{:#x}", v))).unwrap();
        let from_number = convert_argument(&ty, &json!(v)).unwrap();

        prop_assert_eq!(&from_decimal, &expected_unsigned(bits, v));
        prop_assert_eq!(&from_hex, &expected_unsigned(bits, v));
        prop_assert_eq!(&from_number, &expected_unsigned(bits, v));
    }

    #[test]
    fn unsigned_out_of_range_fails(bits in (1usize..=7).prop_map(|n| n * 8), extra in 0u64..1_000_000) {
        let v = (1u64 << bits) + extra;
        let err = convert_argument(&ParamType::Uint(bits), &json!(v.to_string())).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("integer overflows uint{}: {}", bits, v));
    }

    #[test]
    fn signed_in_range_converts(bits in native_width(), raw in any::<i64>()) {
        let v = if bits == 64 { raw } else { raw >> (64 - bits) };
        let converted = convert_argument(&ParamType::Int(bits), &json!(v.to_string())).unwrap();
        prop_assert_eq!(converted, expected_signed(bits, v));
    }

    #[test]
    fn signed_out_of_range_fails(bits in (1usize..=7).prop_map(|n| n * 8), extra in 0i64..1_000_000) {
        let v = (1i64 << (bits - 1)) + extra;
        let err = convert_argument(&ParamType::Int(bits), &json!(v.to_string())).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("integer overflows int{}: {}", bits, v));
    }

    #[test]
    fn negative_unsigned_fails(bits in native_width(), v in 1u64..u64::MAX) {
        let text = format!("-{}", v);
        let err = convert_argument(&ParamType::Uint(bits), &json!(text)).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("negative value in unsigned field: -{}", v));
    }

    #[test]
    fn floats_never_convert_to_integers(bits in native_width(), signed in any::<bool>(), f in -1.0e9f64..1.0e9) {
        prop_assume!(f.fract() != 0.0);
        let ty = if signed { ParamType::Int(bits) } else { ParamType::Uint(bits) };
        let value = serde_json::Number::from_f64(f).map(Value::Number).unwrap();
        prop_assert!(convert_argument(&ty, &value).is_err());
    }

    #[test]
    fn uint256_accepts_full_range(words in proptest::array::uniform4(any::<u64>())) {
        let v = U256(words);
        let converted = convert_argument(&ParamType::Uint(256), &json!(v.to_string())).unwrap();
        prop_assert_eq!(converted, Converted::BigUint(v));
    }

    // ==================== Amounts ====================

    #[test]
    fn parse_amount_scales_decimals(whole in 0u64..1_000_000, frac in "[0-9]{1,18}") {
        let parsed = parse_amount(&format!("{}.{}GO", whole, frac)).unwrap();
        let padded = format!("{:0<18}", frac);
        let expected = U256::from(whole) * U256::exp10(18) + U256::from_dec_str(&padded).unwrap();
        prop_assert_eq!(parsed, expected);
    }

    #[test]
    fn format_then_parse_is_identity(words in proptest::array::uniform2(any::<u64>())) {
        let wei = U256([words[0], words[1], 0, 0]);
        prop_assert_eq!(parse_base(&wei_as_base(&wei)).unwrap(), wei);
    }

    #[test]
    fn too_many_decimals_fails(decimals in 0usize..18, extra in 1usize..5) {
        let value = format!("1.{}", "1".repeat(decimals + extra));
        let err = parse_units(&value, decimals).unwrap_err();
        prop_assert_eq!(
            err.to_string(),
            format!("too many decimal digits {}: limit {}", decimals + extra, decimals)
        );
    }

    #[test]
    fn format_units_has_no_trailing_zeros(v in any::<u64>(), decimals in 0usize..24) {
        let text = format_units(&U256::from(v), decimals);
        if text.contains('.') {
            prop_assert!(!text.ends_with('0'));
        }
    }
}
