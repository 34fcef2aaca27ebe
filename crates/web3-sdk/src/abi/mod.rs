//! ABI encoding and decoding for Solidity contracts
//!
//! This module provides functionality for:
//! - Parsing contract ABI JSON
//! - Encoding function calls and constructor arguments
//! - Decoding return values and event logs
//! - Converting untyped (string or JSON) arguments to ABI values
//!
//! # Example
//!
//! ```rust
//! use web3_sdk::abi::{convert_arguments, Abi};
//! use serde_json::json;
//!
//! let abi = Abi::from_json(r#"[{"type":"function","name":"transfer",
//!     "inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],
//!     "outputs":[{"name":"","type":"bool"}]}]"#).unwrap();
//! let transfer = abi.function("transfer").unwrap();
//! let args = convert_arguments(
//!     &transfer.inputs,
//!     &[json!("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d"), json!("1000")],
//! ).unwrap();
//! let data = transfer.encode_input(&args).unwrap();
//! assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
//! ```

mod convert;
mod decode;
mod encode;
mod json;
mod logs;
mod types;

pub use convert::{
    convert_argument, convert_arguments, convert_int, convert_output, convert_outputs,
    parse_int_literal, Converted,
};
pub use decode::{decode, decode_output};
pub use encode::{encode, encode_function_call, encode_params, event_topic, function_selector};
pub use json::{parse_type, Abi, ConstructorDef, EventDef, FunctionDef, Param};
pub use logs::{parse_log, parse_logs};
pub use types::{ParamType, Token, I256};

/// Decode ABI-encoded parameters; alias of [`decode`]
pub use decode::decode as decode_params;
