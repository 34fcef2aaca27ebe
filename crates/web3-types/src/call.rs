//! Message call arguments

use crate::serde_hex;
use bytes::Bytes;
use serde::Serialize;
use web3_primitives::{Address, U256};

/// Arguments for `eth_call` and `eth_estimateGas`.
///
/// Unset fields are omitted from the wire object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallMsg {
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Destination; `None` for contract creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    /// Call data
    #[serde(with = "serde_hex::bytes", skip_serializing_if = "Bytes::is_empty")]
    pub data: Bytes,
    /// Value in wei
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    /// Gas limit; 0 means unset
    #[serde(with = "serde_hex::quantity", skip_serializing_if = "is_zero")]
    pub gas: u64,
    /// Gas price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl CallMsg {
    /// Call to `to` with the given data
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to: Some(to),
            data: data.into(),
            ..Default::default()
        }
    }

    /// Set the sender
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the value
    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_msg_minimal() {
        let msg = CallMsg::new(Address::from_bytes([0x11; 20]), vec![0x70, 0xa0, 0x82, 0x31]);
        let v = serde_json::to_value(&msg).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(v["to"], "0x1111111111111111111111111111111111111111");
        assert_eq!(v["data"], "0x70a08231");
    }

    #[test]
    fn test_call_msg_full() {
        let msg = CallMsg {
            from: Some(Address::from_bytes([0x22; 20])),
            to: None,
            data: Bytes::new(),
            value: Some(U256::from(10)),
            gas: 21000,
            gas_price: Some(U256::from(1_000_000_000u64)),
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert!(v.get("to").is_none());
        assert!(v.get("data").is_none());
        assert_eq!(v["value"], "0xa");
        assert_eq!(v["gas"], "0x5208");
        assert_eq!(v["gasPrice"], "0x3b9aca00");
    }
}
