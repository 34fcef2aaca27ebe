//! Serde helpers for the hex encodings used on the JSON-RPC wire.
//!
//! Use with `#[serde(with = "...")]`.

use serde::{de, Deserialize, Deserializer, Serializer};

fn parse_quantity<E: de::Error>(s: &str) -> Result<u64, E> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| E::custom(format!("quantity without 0x prefix: {s:?}")))?;
    if digits.is_empty() {
        return Err(E::custom("empty quantity"));
    }
    u64::from_str_radix(digits, 16).map_err(|e| E::custom(format!("invalid quantity {s:?}: {e}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityRepr {
    Hex(String),
    Num(u64),
}

/// `u64` as a `0x` quantity. Plain JSON numbers are accepted on input.
pub mod quantity {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    /// Deserialize
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match QuantityRepr::deserialize(deserializer)? {
            QuantityRepr::Hex(s) => parse_quantity(&s),
            QuantityRepr::Num(n) => Ok(n),
        }
    }
}

/// `Option<u64>` as an optional quantity; `null` maps to `None`.
pub mod opt_quantity {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_str(&format!("{v:#x}")),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        match Option::<QuantityRepr>::deserialize(deserializer)? {
            Some(QuantityRepr::Hex(s)) => parse_quantity(&s).map(Some),
            Some(QuantityRepr::Num(n)) => Ok(Some(n)),
            None => Ok(None),
        }
    }
}

/// Raw bytes as `0x`-prefixed hex.
pub mod bytes {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(value: &::bytes::Bytes, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    /// Deserialize
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<::bytes::Bytes, D::Error> {
        let s = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        decode(&s).map_err(de::Error::custom)
    }

    /// Decode a hex string, tolerating a missing prefix and odd length.
    pub fn decode(s: &str) -> Result<::bytes::Bytes, hex::FromHexError> {
        let digits = web3_primitives::strip_0x(s);
        if digits.len() % 2 == 1 {
            let padded = format!("0{digits}");
            return hex::decode(padded).map(Into::into);
        }
        hex::decode(digits).map(Into::into)
    }
}

/// `Option<Bytes>` as optional hex.
pub mod opt_bytes {
    use super::*;

    /// Serialize
    pub fn serialize<S: Serializer>(
        value: &Option<::bytes::Bytes>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::bytes::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<::bytes::Bytes>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => super::bytes::decode(&s).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        #[serde(with = "super::quantity")]
        q: u64,
        #[serde(with = "super::opt_quantity", default)]
        o: Option<u64>,
        #[serde(with = "super::bytes")]
        b: ::bytes::Bytes,
    }

    #[test]
    fn test_quantity_roundtrip() {
        let s = Sample {
            q: 255,
            o: Some(0),
            b: ::bytes::Bytes::from_static(&[0xde, 0xad]),
        };
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"q":"0xff","o":"0x0","b":"0xdead"}"#);
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_quantity_accepts_numbers_and_null() {
        let s: Sample = serde_json::from_str(r#"{"q":12,"o":null,"b":"0x"}"#).unwrap();
        assert_eq!(s.q, 12);
        assert_eq!(s.o, None);
        assert!(s.b.is_empty());
    }

    #[test]
    fn test_quantity_rejects_bad_input() {
        assert!(serde_json::from_str::<Sample>(r#"{"q":"ff","b":"0x"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"q":"0x","b":"0x"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"q":"0xzz","b":"0x"}"#).is_err());
    }

    #[test]
    fn test_bytes_odd_length() {
        assert_eq!(super::bytes::decode("0x1").unwrap().as_ref(), &[0x01]);
    }
}
