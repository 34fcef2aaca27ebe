//! Decoding of event logs against a contract ABI

use serde_json::Value;
use web3_types::{Event, EventField, Log};

use super::convert::convert_output;
use super::decode::decode;
use super::json::Abi;
use super::types::ParamType;
use crate::SdkError;

/// Decode every log into a named event with fields in ABI input order.
///
/// Non-indexed inputs come from the log data; indexed inputs are reported as
/// the raw topic hex, since dynamic indexed values are stored as hashes.
pub fn parse_logs(abi: &Abi, logs: &[Log]) -> Result<Vec<Event>, SdkError> {
    logs.iter().map(|log| parse_log(abi, log)).collect()
}

/// Decode a single log
pub fn parse_log(abi: &Abi, log: &Log) -> Result<Event, SdkError> {
    let signature = log
        .topics
        .first()
        .ok_or_else(|| SdkError::AbiDecode("log has no topics".to_string()))?;
    let event = abi
        .event_by_topic(signature)
        .ok_or_else(|| SdkError::EventNotFound(signature.to_hex()))?;

    let data_types: Vec<ParamType> = event
        .inputs
        .iter()
        .filter(|input| !input.indexed)
        .map(|input| input.kind.clone())
        .collect();
    let data_tokens = decode(&data_types, &log.data).map_err(|e| {
        SdkError::AbiDecode(format!("cannot decode data of event {}: {}", event.name, e))
    })?;

    let mut data_values = data_types.iter().zip(data_tokens.iter());
    let mut topics = log.topics.iter().skip(1);
    let mut fields = Vec::with_capacity(event.inputs.len());

    for input in &event.inputs {
        let value = if input.indexed {
            let topic = topics.next().ok_or_else(|| {
                SdkError::AbiDecode(format!(
                    "missing topic for indexed input {} of event {}",
                    input.name, event.name
                ))
            })?;
            Value::String(topic.to_hex())
        } else {
            match data_values.next() {
                Some((ty, token)) => convert_output(ty, token)?,
                None => {
                    return Err(SdkError::AbiDecode(format!(
                        "missing data for input {} of event {}",
                        input.name, event.name
                    )))
                }
            }
        };
        fields.push(EventField {
            name: input.name.clone(),
            value,
        });
    }

    Ok(Event {
        name: event.name.clone(),
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use web3_primitives::{Address, H256};

    const ABI: &str = r#"[
        {"anonymous":false,"inputs":[
            {"indexed":true,"name":"from","type":"address"},
            {"indexed":false,"name":"value","type":"uint256"},
            {"indexed":true,"name":"to","type":"address"}],"name":"Transfer","type":"event"}
    ]"#;

    fn transfer_topic() -> H256 {
        H256::from_hex("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef").unwrap()
    }

    fn log(topics: Vec<H256>, data: Vec<u8>) -> Log {
        serde_json::from_value(json!({
            "address": Address::ZERO.to_hex(),
            "topics": topics.iter().map(H256::to_hex).collect::<Vec<_>>(),
            "data": format!("0x{}", hex::encode(data)),
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_logs_preserves_input_order() {
        let abi = Abi::from_json(ABI).unwrap();
        let from = H256::from_bytes([1u8; 32]);
        let to = H256::from_bytes([2u8; 32]);
        let mut data = vec![0u8; 32];
        data[31] = 9;

        let events = parse_logs(&abi, &[log(vec![transfer_topic(), from, to], data)]).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.name, "Transfer");
        let names: Vec<&str> = event.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["from", "value", "to"]);
        assert_eq!(event.field("from"), Some(&json!(from.to_hex())));
        assert_eq!(event.field("value"), Some(&json!("9")));
        assert_eq!(event.field("to"), Some(&json!(to.to_hex())));
    }

    #[test]
    fn test_unmatched_topic() {
        let abi = Abi::from_json(ABI).unwrap();
        let err = parse_logs(&abi, &[log(vec![H256::ZERO], vec![])]).unwrap_err();
        assert!(matches!(err, SdkError::EventNotFound(_)));
    }

    #[test]
    fn test_no_topics() {
        let abi = Abi::from_json(ABI).unwrap();
        assert!(parse_logs(&abi, &[log(vec![], vec![])]).is_err());
    }

    #[test]
    fn test_missing_indexed_topic() {
        let abi = Abi::from_json(ABI).unwrap();
        let err = parse_logs(&abi, &[log(vec![transfer_topic()], vec![0u8; 32])]).unwrap_err();
        assert!(err.to_string().contains("missing topic"));
    }

    #[test]
    fn test_truncated_data() {
        let abi = Abi::from_json(ABI).unwrap();
        let topics = vec![transfer_topic(), H256::ZERO, H256::ZERO];
        assert!(parse_logs(&abi, &[log(topics, vec![0u8; 8])]).is_err());
    }
}
