//! CLI configuration management
//!
//! Values resolve from the command line first, then the `WEB3_*`
//! environment (both handled by clap), then `~/.web3/config.toml`, then the
//! built-in network defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use web3_sdk::networks::{self, DEFAULT_NETWORK};
use web3_sdk::registry::DEFAULT_IPFS_URL;

use crate::{output::OutputFormat, CliError};

/// EVM version passed to solc when none is configured
pub const DEFAULT_EVM_VERSION: &str = "petersburg";

/// Persisted CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Built-in network name
    pub network: Option<String>,
    /// RPC endpoint URL, used instead of `network` when set
    pub rpc_url: Option<String>,
    /// DIDRegistry contract address
    pub did_registry: Option<String>,
    /// IPFS API base URL
    pub ipfs_url: Option<String>,
    /// Tag of the `ethereum/solc` docker image
    pub solc_version: Option<String>,
    /// `--evm-version` passed to solc
    pub evm_version: Option<String>,
    /// `json` or `text`
    pub output_format: Option<String>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".web3"))
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load config from `path`, or from the default location.
    ///
    /// A missing default file yields the default config; an explicitly
    /// given file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::config_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CliError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// RPC endpoint the commands talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Network name, if a built-in network was selected
    pub name: Option<String>,
    /// JSON-RPC URL
    pub url: String,
    /// Display name of the native unit
    pub unit: String,
}

/// Pick the RPC endpoint from flags and config.
///
/// `--rpc-url` excludes both `--network` and `--testnet` on the command
/// line; config values only apply when no flag was given.
pub fn resolve_endpoint(
    network: Option<&str>,
    testnet: bool,
    rpc_url: Option<&str>,
    config: &Config,
) -> Result<Endpoint, CliError> {
    if let Some(url) = rpc_url {
        if let Some(name) = network {
            return Err(CliError::Config(format!(
                "Cannot set both rpcURL {:?} and network {:?}",
                url, name
            )));
        }
        if testnet {
            return Err(CliError::Config(format!(
                "Cannot set both rpcURL {:?} and testnet",
                url
            )));
        }
        return Ok(custom_endpoint(url));
    }

    let name = match (network, testnet) {
        (Some(name), true) => {
            return Err(CliError::Config(format!(
                "Cannot set both network {:?} and testnet",
                name
            )))
        }
        (None, true) => "testnet",
        (Some(name), false) => name,
        (None, false) => {
            if let Some(url) = config.rpc_url.as_deref() {
                return Ok(custom_endpoint(url));
            }
            config.network.as_deref().unwrap_or(DEFAULT_NETWORK)
        }
    };

    let network = networks::network(name)
        .map_err(|_| CliError::Config(format!("Unrecognized network {:?}", name)))?;
    Ok(Endpoint {
        name: Some(network.name.to_string()),
        url: network.url.to_string(),
        unit: network.unit.to_string(),
    })
}

fn custom_endpoint(url: &str) -> Endpoint {
    Endpoint {
        name: None,
        url: url.to_string(),
        unit: "GO".to_string(),
    }
}

/// Output format from the flag, falling back to the config file
pub fn resolve_format(flag: Option<OutputFormat>, config: &Config) -> Result<OutputFormat, CliError> {
    if let Some(format) = flag {
        return Ok(format);
    }
    match config.output_format.as_deref() {
        None | Some("") | Some("text") => Ok(OutputFormat::Text),
        Some("json") => Ok(OutputFormat::Json),
        Some(other) => Err(CliError::Config(format!(
            "unrecognized output_format {:?}: expected \"json\" or \"text\"",
            other
        ))),
    }
}

/// Fully resolved settings shared by all commands
#[derive(Debug, Clone)]
pub struct Settings {
    /// Where RPC calls go
    pub endpoint: Endpoint,
    /// Output format
    pub format: OutputFormat,
    /// Signing key from `--private-key` / `WEB3_PRIVATE_KEY`
    pub private_key: Option<String>,
    /// DIDRegistry address from config
    pub did_registry: Option<String>,
    /// IPFS API base URL
    pub ipfs_url: String,
    /// Default solc image tag
    pub solc_version: Option<String>,
    /// Default EVM version
    pub evm_version: String,
}

impl Settings {
    /// Merge the global flags with the loaded config
    pub fn resolve(
        network: Option<&str>,
        testnet: bool,
        rpc_url: Option<&str>,
        format: Option<OutputFormat>,
        private_key: Option<String>,
        config: Config,
    ) -> Result<Self, CliError> {
        Ok(Self {
            endpoint: resolve_endpoint(network, testnet, rpc_url, &config)?,
            format: resolve_format(format, &config)?,
            private_key: private_key.filter(|k| !k.is_empty()),
            did_registry: config.did_registry,
            ipfs_url: config
                .ipfs_url
                .unwrap_or_else(|| DEFAULT_IPFS_URL.to_string()),
            solc_version: config.solc_version,
            evm_version: config
                .evm_version
                .unwrap_or_else(|| DEFAULT_EVM_VERSION.to_string()),
        })
    }

    /// Whether output should be JSON
    pub fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// The configured private key, or an error naming its variable
    pub fn require_private_key(&self) -> Result<&str, CliError> {
        self.private_key
            .as_deref()
            .ok_or(CliError::Missing(crate::PRIVATE_KEY_VAR))
    }
}
