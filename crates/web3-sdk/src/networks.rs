//! Built-in networks

use crate::SdkError;

/// Name of the network used when none is configured
pub const DEFAULT_NETWORK: &str = "gochain";

/// A named RPC endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Network {
    /// Short name used on the command line
    pub name: &'static str,
    /// JSON-RPC URL
    pub url: &'static str,
    /// Expected chain id, when known
    pub chain_id: Option<u64>,
    /// Display name of the native unit
    pub unit: &'static str,
    /// Block explorer URL
    pub explorer_url: Option<&'static str>,
}

/// All built-in networks
pub const NETWORKS: &[Network] = &[
    Network {
        name: "testnet",
        url: "https://testnet-rpc.gochain.io",
        chain_id: Some(31337),
        unit: "GO",
        explorer_url: Some("https://testnet-explorer.gochain.io/api"),
    },
    Network {
        name: "gochain",
        url: "https://rpc.gochain.io",
        chain_id: Some(60),
        unit: "GO",
        explorer_url: Some("https://explorer.gochain.io/api"),
    },
    Network {
        name: "localhost",
        url: "http://localhost:8545",
        chain_id: None,
        unit: "GO",
        explorer_url: None,
    },
    Network {
        name: "ethereum",
        url: "https://mainnet.infura.io/v3/bc5b0e5cfd9b4385befb69a68a9400c3",
        chain_id: Some(1),
        unit: "ETH",
        explorer_url: Some("https://etherscan.io"),
    },
    Network {
        name: "ropsten",
        url: "https://ropsten-rpc.linkpool.io",
        chain_id: Some(3),
        unit: "ETH",
        explorer_url: None,
    },
];

/// Look up a built-in network by name
pub fn network(name: &str) -> Result<&'static Network, SdkError> {
    NETWORKS
        .iter()
        .find(|n| n.name == name)
        .ok_or_else(|| SdkError::Convert(format!("unrecognized network {}", name)))
}
