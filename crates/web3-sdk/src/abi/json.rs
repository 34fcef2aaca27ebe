//! Contract ABI model parsed from the standard JSON interface description

use std::str::FromStr;

use serde::Deserialize;
use web3_primitives::H256;

use super::decode::decode_output;
use super::encode::{encode_params, event_topic, function_selector};
use super::types::{ParamType, Token};
use crate::SdkError;

/// A named function, event or constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Parameter name; may be empty
    pub name: String,
    /// Parameter type
    pub kind: ParamType,
    /// Whether an event input is stored in a topic
    pub indexed: bool,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Input parameters
    pub inputs: Vec<Param>,
    /// Output parameters
    pub outputs: Vec<Param>,
    /// `pure`, `view`, `nonpayable` or `payable`
    pub state_mutability: String,
}

impl FunctionDef {
    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// Function selector (4 bytes)
    pub fn selector(&self) -> [u8; 4] {
        function_selector(&self.signature())
    }

    /// Whether calling the function cannot change state
    pub fn is_constant(&self) -> bool {
        matches!(self.state_mutability.as_str(), "view" | "pure")
    }

    /// Input parameter types
    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Output parameter types
    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.kind.clone()).collect()
    }

    /// Encode a call: selector followed by the packed arguments
    pub fn encode_input(&self, args: &[Token]) -> Result<Vec<u8>, SdkError> {
        let mut data = self.selector().to_vec();
        data.extend(encode_params(&self.input_types(), args)?);
        Ok(data)
    }
}

/// Event definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Inputs in declaration order
    pub inputs: Vec<Param>,
    /// Anonymous events have no signature topic
    pub anonymous: bool,
}

impl EventDef {
    /// Canonical signature, e.g. `Transfer(address,address,uint256)`
    pub fn signature(&self) -> String {
        signature(&self.name, &self.inputs)
    }

    /// Signature topic (`topics[0]` of matching logs)
    pub fn topic(&self) -> H256 {
        event_topic(&self.signature())
    }
}

/// Constructor definition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConstructorDef {
    /// Input parameters
    pub inputs: Vec<Param>,
}

/// Parsed contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Abi {
    /// Constructor, if declared
    pub constructor: Option<ConstructorDef>,
    /// Functions in declaration order
    pub functions: Vec<FunctionDef>,
    /// Events in declaration order
    pub events: Vec<EventDef>,
}

impl Abi {
    /// Parse an ABI from its JSON text
    pub fn from_json(json: &str) -> Result<Self, SdkError> {
        let entries: Vec<RawEntry> = serde_json::from_str(json)
            .map_err(|e| SdkError::Serialization(format!("failed to parse ABI: {}", e)))?;
        Self::from_entries(entries)
    }

    /// Parse an ABI from an already decoded JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, SdkError> {
        let entries: Vec<RawEntry> = serde_json::from_value(value)
            .map_err(|e| SdkError::Serialization(format!("failed to parse ABI: {}", e)))?;
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<RawEntry>) -> Result<Self, SdkError> {
        let mut abi = Abi::default();
        for entry in entries {
            match entry.kind.as_deref().unwrap_or("function") {
                "function" => {
                    let state_mutability = match entry.state_mutability {
                        Some(m) => m,
                        None if entry.constant => "view".to_string(),
                        None if entry.payable => "payable".to_string(),
                        None => "nonpayable".to_string(),
                    };
                    abi.functions.push(FunctionDef {
                        name: entry.name,
                        inputs: parse_params(&entry.inputs)?,
                        outputs: parse_params(&entry.outputs)?,
                        state_mutability,
                    });
                }
                "event" => abi.events.push(EventDef {
                    name: entry.name,
                    inputs: parse_params(&entry.inputs)?,
                    anonymous: entry.anonymous,
                }),
                "constructor" => {
                    abi.constructor = Some(ConstructorDef {
                        inputs: parse_params(&entry.inputs)?,
                    })
                }
                // fallback, receive and error entries carry nothing callable by name
                _ => {}
            }
        }
        Ok(abi)
    }

    /// Get the first function with this name
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Get an event by name
    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.name == name)
    }

    /// Find the non-anonymous event whose signature topic matches
    pub fn event_by_topic(&self, topic: &H256) -> Option<&EventDef> {
        self.events.iter().find(|e| !e.anonymous && e.topic() == *topic)
    }

    /// Encode a function call by name
    pub fn encode_call(&self, name: &str, args: &[Token]) -> Result<Vec<u8>, SdkError> {
        self.function_or_err(name)?.encode_input(args)
    }

    /// Decode a function's return data by name
    pub fn decode_output(&self, name: &str, data: &[u8]) -> Result<Vec<Token>, SdkError> {
        let function = self.function_or_err(name)?;
        decode_output(&function.output_types(), data)
    }

    /// Encode constructor arguments (no selector)
    pub fn encode_constructor(&self, args: &[Token]) -> Result<Vec<u8>, SdkError> {
        match &self.constructor {
            Some(ctor) => {
                let types: Vec<ParamType> = ctor.inputs.iter().map(|p| p.kind.clone()).collect();
                encode_params(&types, args)
            }
            None if args.is_empty() => Ok(Vec::new()),
            None => Err(SdkError::AbiEncode(
                "constructor arguments given but ABI has no constructor".to_string(),
            )),
        }
    }

    /// Constructor inputs; empty when there is no constructor
    pub fn constructor_inputs(&self) -> &[Param] {
        self.constructor.as_ref().map(|c| c.inputs.as_slice()).unwrap_or(&[])
    }

    fn function_or_err(&self, name: &str) -> Result<&FunctionDef, SdkError> {
        self.function(name)
            .ok_or_else(|| SdkError::AbiEncode(format!("method '{}' not found", name)))
    }
}

impl FromStr for Abi {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Abi::from_json(s)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
    #[serde(default)]
    state_mutability: Option<String>,
    #[serde(default)]
    constant: bool,
    #[serde(default)]
    payable: bool,
    #[serde(default)]
    anonymous: bool,
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    components: Vec<RawParam>,
}

fn parse_params(raw: &[RawParam]) -> Result<Vec<Param>, SdkError> {
    raw.iter()
        .map(|p| {
            Ok(Param {
                name: p.name.clone(),
                kind: parse_type_with_components(&p.kind, &p.components)?,
                indexed: p.indexed,
            })
        })
        .collect()
}

fn signature(name: &str, inputs: &[Param]) -> String {
    let types: Vec<String> = inputs.iter().map(|p| p.kind.to_string()).collect();
    format!("{}({})", name, types.join(","))
}

/// Parse a type string (e.g. `uint256`, `address[2]`, `bytes32[]`)
pub fn parse_type(s: &str) -> Result<ParamType, SdkError> {
    parse_type_with_components(s, &[])
}

fn parse_type_with_components(s: &str, components: &[RawParam]) -> Result<ParamType, SdkError> {
    let s = s.trim();

    if let Some(body) = s.strip_suffix(']') {
        let open = body
            .rfind('[')
            .ok_or_else(|| SdkError::Serialization(format!("unsupported ABI type: {}", s)))?;
        let inner = Box::new(parse_type_with_components(&body[..open], components)?);
        let size = &body[open + 1..];
        if size.is_empty() {
            return Ok(ParamType::Array(inner));
        }
        let size: usize = size
            .parse()
            .map_err(|_| SdkError::Serialization(format!("invalid array size in type: {}", s)))?;
        return Ok(ParamType::FixedArray(inner, size));
    }

    match s {
        "address" => return Ok(ParamType::Address),
        "bool" => return Ok(ParamType::Bool),
        "string" => return Ok(ParamType::String),
        "bytes" => return Ok(ParamType::Bytes),
        "uint" => return Ok(ParamType::Uint(256)),
        "int" => return Ok(ParamType::Int(256)),
        // address followed by a selector
        "function" => return Ok(ParamType::FixedBytes(24)),
        "tuple" => {
            let types = components
                .iter()
                .map(|c| parse_type_with_components(&c.kind, &c.components))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(ParamType::Tuple(types));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("uint") {
        return Ok(ParamType::Uint(int_bits(s, rest)?));
    }
    if let Some(rest) = s.strip_prefix("int") {
        return Ok(ParamType::Int(int_bits(s, rest)?));
    }
    if let Some(rest) = s.strip_prefix("bytes") {
        let size: usize = rest
            .parse()
            .map_err(|_| SdkError::Serialization(format!("unsupported ABI type: {}", s)))?;
        if size == 0 || size > 32 {
            return Err(SdkError::Serialization(format!("invalid byte array size: {}", s)));
        }
        return Ok(ParamType::FixedBytes(size));
    }

    Err(SdkError::Serialization(format!("unsupported ABI type: {}", s)))
}

fn int_bits(ty: &str, rest: &str) -> Result<usize, SdkError> {
    let bits: usize = rest
        .parse()
        .map_err(|_| SdkError::Serialization(format!("unsupported ABI type: {}", ty)))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(SdkError::Serialization(format!("invalid integer size: {}", ty)));
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3_primitives::{Address, U256};

    const TOKEN_ABI: &str = r#"[
        {"constant":true,"inputs":[{"name":"_owner","type":"address"}],"name":"balanceOf",
         "outputs":[{"name":"balance","type":"uint256"}],"type":"function"},
        {"inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"name":"transfer",
         "outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable","type":"function"},
        {"inputs":[{"name":"supply","type":"uint256"}],"type":"constructor"},
        {"anonymous":false,"inputs":[
            {"indexed":true,"name":"from","type":"address"},
            {"indexed":true,"name":"to","type":"address"},
            {"indexed":false,"name":"value","type":"uint256"}],"name":"Transfer","type":"event"},
        {"payable":true,"stateMutability":"payable","type":"fallback"}
    ]"#;

    // ==================== Parsing ====================

    #[test]
    fn test_parse_abi() {
        let abi = Abi::from_json(TOKEN_ABI).unwrap();
        assert_eq!(abi.functions.len(), 2);
        assert_eq!(abi.events.len(), 1);
        assert_eq!(abi.constructor_inputs().len(), 1);

        let balance_of = abi.function("balanceOf").unwrap();
        assert!(balance_of.is_constant());
        assert_eq!(balance_of.signature(), "balanceOf(address)");
        assert_eq!(balance_of.selector(), [0x70, 0xa0, 0x82, 0x31]);
        assert!(!abi.function("transfer").unwrap().is_constant());
    }

    #[test]
    fn test_parse_invalid_abi() {
        assert!(Abi::from_json("not json").is_err());
        assert!(Abi::from_json(r#"[{"type":"function","name":"f","inputs":[{"type":"uint7"}]}]"#).is_err());
    }

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("address").unwrap(), ParamType::Address);
        assert_eq!(parse_type("uint").unwrap(), ParamType::Uint(256));
        assert_eq!(parse_type("int").unwrap(), ParamType::Int(256));
        assert_eq!(parse_type("uint8").unwrap(), ParamType::Uint(8));
        assert_eq!(parse_type("bytes32").unwrap(), ParamType::FixedBytes(32));
        assert_eq!(
            parse_type("address[]").unwrap(),
            ParamType::Array(Box::new(ParamType::Address))
        );
        assert_eq!(
            parse_type("uint8[2][]").unwrap(),
            ParamType::Array(Box::new(ParamType::FixedArray(Box::new(ParamType::Uint(8)), 2)))
        );
        assert!(parse_type("bytes33").is_err());
        assert!(parse_type("uint9").is_err());
        assert!(parse_type("foo").is_err());
    }

    #[test]
    fn test_parse_tuple_components() {
        let abi = Abi::from_json(
            r#"[{"type":"function","name":"submit","inputs":[
                {"name":"order","type":"tuple[]","components":[
                    {"name":"maker","type":"address"},{"name":"amount","type":"uint256"}]}],
                "outputs":[]}]"#,
        )
        .unwrap();
        assert_eq!(abi.functions[0].signature(), "submit((address,uint256)[])");
    }

    // ==================== Calls ====================

    #[test]
    fn test_encode_call_and_decode_output() {
        let abi = Abi::from_json(TOKEN_ABI).unwrap();
        let owner = Address::from_bytes([7u8; 20]);

        let data = abi.encode_call("balanceOf", &[Token::Address(owner)]).unwrap();
        assert_eq!(&data[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(data.len(), 36);

        let mut ret = [0u8; 32];
        ret[31] = 42;
        let out = abi.decode_output("balanceOf", &ret).unwrap();
        assert_eq!(out, vec![Token::Uint(U256::from(42))]);

        assert!(abi.encode_call("mint", &[]).is_err());
        assert!(abi.encode_call("balanceOf", &[]).is_err());
    }

    #[test]
    fn test_encode_constructor() {
        let abi = Abi::from_json(TOKEN_ABI).unwrap();
        let packed = abi.encode_constructor(&[Token::Uint(U256::from(1))]).unwrap();
        assert_eq!(packed.len(), 32);

        let empty = Abi::default();
        assert!(empty.encode_constructor(&[]).unwrap().is_empty());
        assert!(empty.encode_constructor(&[Token::Bool(true)]).is_err());
    }

    #[test]
    fn test_event_by_topic() {
        let abi = Abi::from_json(TOKEN_ABI).unwrap();
        let topic = H256::from_hex("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef").unwrap();
        assert_eq!(abi.event_by_topic(&topic).unwrap().name, "Transfer");
        assert!(abi.event_by_topic(&H256::ZERO).is_none());
    }
}
