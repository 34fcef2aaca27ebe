//! Account commands

use std::path::PathBuf;

use clap::Subcommand;
use tracing::info;
use web3_sdk::Wallet;

use super::Context;
use crate::keystore::{self, KeystoreV3};
use crate::output::Output;
use crate::CliError;

/// Account subcommands
#[derive(Debug, Subcommand)]
pub enum AccountCommand {
    /// Create a new random account
    Create {
        /// Also write an encrypted keystore to this path
        #[arg(long, requires = "password")]
        keystore: Option<PathBuf>,
        /// Keystore password
        #[arg(long)]
        password: Option<String>,
        /// Use light scrypt parameters
        #[arg(long)]
        light_kdf: bool,
    },
    /// Extract the private key from a keystore file
    Extract {
        /// Keystore file
        #[arg(long)]
        keyfile: PathBuf,
        /// Keystore password
        #[arg(long)]
        password: String,
    },
}

impl AccountCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        match self {
            AccountCommand::Create {
                keystore,
                password,
                light_kdf,
            } => {
                let wallet = Wallet::random();
                let mut out = account_output(ctx, &wallet);
                if let (Some(path), Some(password)) = (keystore, password) {
                    let (n, p) = if light_kdf {
                        (keystore::LIGHT_SCRYPT_N, keystore::LIGHT_SCRYPT_P)
                    } else {
                        (keystore::STANDARD_SCRYPT_N, keystore::STANDARD_SCRYPT_P)
                    };
                    let ks = keystore::encrypt(&wallet, &password, n, p)?;
                    std::fs::write(&path, serde_json::to_string_pretty(&ks)?)?;
                    info!(path = %path.display(), "wrote keystore");
                    out = out
                        .field("keystore", path.display())
                        .line(format!("Keystore: {}", path.display()));
                }
                out.print();
                Ok(())
            }
            AccountCommand::Extract { keyfile, password } => {
                let content = std::fs::read_to_string(&keyfile).map_err(|e| {
                    CliError::context(&format!("Failed to read file {:?}", keyfile), e)
                })?;
                let ks: KeystoreV3 = serde_json::from_str(&content)
                    .map_err(|e| CliError::Keystore(format!("invalid keystore file: {}", e)))?;
                let wallet = keystore::decrypt(&ks, &password)?;
                account_output(ctx, &wallet).print();
                Ok(())
            }
        }
    }
}

fn account_output(ctx: &Context, wallet: &Wallet) -> Output {
    Output::new(ctx.json())
        .field("private_key", wallet.private_key_hex())
        .field("address", wallet.address())
        .line(format!("Private key: {}", wallet.private_key_hex()))
        .line(format!("Public address: {}", wallet.address()))
}
