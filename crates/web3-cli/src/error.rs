//! CLI error types

use thiserror::Error;
use web3_sdk::SdkError;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid address format
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid hex string
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Invalid amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid or missing input
    #[error("{0}")]
    InvalidInput(String),

    /// A required value was neither passed nor configured
    #[error("{0} not set")]
    Missing(&'static str),

    /// Failure reported by the SDK
    #[error(transparent)]
    Sdk(#[from] SdkError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Keystore error
    #[error("Keystore error: {0}")]
    Keystore(String),

    /// Fetching a remote file failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An operation failed, with a description of what was attempted
    #[error("{0}")]
    Failed(String),

    /// A credential failed verification; the status line is already printed
    #[error("credential not verified")]
    NotVerified,
}

impl CliError {
    /// Prefix an underlying error with what was being attempted
    pub fn context(msg: &str, err: impl std::fmt::Display) -> Self {
        CliError::Failed(format!("{}: {}", msg, err))
    }
}
