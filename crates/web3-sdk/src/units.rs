//! Amount parsing and formatting
//!
//! Amounts are held in wei as [`U256`]. The base unit (GO or ETH) is 10^18
//! wei and gwei (nanoGO) is 10^9 wei.

use web3_primitives::U256;

use crate::SdkError;

/// Decimals of the base unit
pub const BASE_DECIMALS: usize = 18;

/// Decimals of gwei
pub const GWEI_DECIMALS: usize = 9;

/// Parse a human readable amount with an optional unit suffix into wei.
///
/// Suffixes (case-insensitive): `nanogo`/`gwei` (10^9), `attogo`/`wei` (1),
/// `go`/`eth` or none (10^18). Decimal fractions are allowed up to the
/// unit's precision, so `1.5go` is 1.5 × 10^18 wei.
pub fn parse_amount(amount: &str) -> Result<U256, SdkError> {
    let lower = amount.trim().to_ascii_lowercase();
    let (value, decimals) = if let Some(v) = lower.strip_suffix("nanogo") {
        (v, GWEI_DECIMALS)
    } else if let Some(v) = lower.strip_suffix("gwei") {
        (v, GWEI_DECIMALS)
    } else if let Some(v) = lower.strip_suffix("attogo") {
        (v, 0)
    } else if let Some(v) = lower.strip_suffix("wei") {
        (v, 0)
    } else if let Some(v) = lower.strip_suffix("eth") {
        (v, BASE_DECIMALS)
    } else {
        (lower.strip_suffix("go").unwrap_or(&lower), BASE_DECIMALS)
    };
    parse_units(value, decimals)
}

/// Parse a base-10 integer
pub fn parse_big_int(value: &str) -> Result<U256, SdkError> {
    if value.is_empty() {
        return Err(SdkError::Units("Cannot parse empty string".to_string()));
    }
    parse_digits(value).ok_or_else(|| SdkError::Units(format!("Failed to parse integer {:?}", value)))
}

/// Parse a decimal amount of gwei into wei
pub fn parse_gwei(g: &str) -> Result<U256, SdkError> {
    parse_units(g, GWEI_DECIMALS)
}

/// Parse a decimal amount of the base unit into wei
pub fn parse_base(b: &str) -> Result<U256, SdkError> {
    parse_units(b, BASE_DECIMALS)
}

/// Parse a decimal string scaled by `10^decimals`
pub fn parse_units(value: &str, decimals: usize) -> Result<U256, SdkError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SdkError::Units("empty value".to_string()));
    }

    let mut parts = value.split('.');
    let whole_str = parts.next().unwrap_or_default();
    let frac_str = parts.next();
    if parts.next().is_some() {
        return Err(SdkError::Units("invalid value: more than one decimal point".to_string()));
    }

    let scale = U256::exp10(decimals);
    let whole = if whole_str.is_empty() && frac_str.is_some() {
        U256::zero()
    } else {
        parse_digits(whole_str)
            .ok_or_else(|| SdkError::Units(format!("failed to parse integer part: {}", whole_str)))?
    };
    let whole = whole
        .checked_mul(scale)
        .ok_or_else(|| SdkError::Units(format!("value out of range: {}", value)))?;

    let Some(frac_str) = frac_str else {
        return Ok(whole);
    };
    if frac_str.len() > decimals {
        return Err(SdkError::Units(format!(
            "too many decimal digits {}: limit {}",
            frac_str.len(),
            decimals
        )));
    }
    if frac_str.is_empty() {
        return Ok(whole);
    }
    let padded = format!("{}{}", frac_str, "0".repeat(decimals - frac_str.len()));
    let frac = parse_digits(&padded)
        .ok_or_else(|| SdkError::Units(format!("failed to parse decimal part: {}", frac_str)))?;

    whole
        .checked_add(frac)
        .ok_or_else(|| SdkError::Units(format!("value out of range: {}", value)))
}

/// `b` base units in wei
pub fn base(b: u64) -> U256 {
    U256::from(b) * U256::exp10(BASE_DECIMALS)
}

/// `g` gwei in wei
pub fn gwei(g: u64) -> U256 {
    U256::from(g) * U256::exp10(GWEI_DECIMALS)
}

/// Format wei in the base unit, e.g. `1.5`
pub fn wei_as_base(wei: &U256) -> String {
    format_units(wei, BASE_DECIMALS)
}

/// Format wei in gwei
pub fn wei_as_gwei(wei: &U256) -> String {
    format_units(wei, GWEI_DECIMALS)
}

/// Format `value / 10^decimals` without trailing fractional zeros
pub fn format_units(value: &U256, decimals: usize) -> String {
    let (whole, frac) = value.div_mod(U256::exp10(decimals));
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

fn parse_digits(s: &str) -> Option<U256> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(s).ok()
}
