//! DID registry commands

use clap::Subcommand;
use web3_sdk::registry;

use super::Context;
use crate::output::{print_json, Output};
use crate::CliError;

/// DID subcommands
#[derive(Debug, Subcommand)]
pub enum DidCommand {
    /// Register a new DID and upload its document to IPFS
    Create {
        /// DID, e.g. did:go:alice
        id: String,
        /// DIDRegistry contract address
        #[arg(long, env = crate::DID_REGISTRY_VAR)]
        registry: Option<String>,
    },
    /// Show the owner of a DID
    Owner {
        /// DID
        id: String,
        /// DIDRegistry contract address
        #[arg(long, env = crate::DID_REGISTRY_VAR)]
        registry: Option<String>,
    },
    /// Show the IPFS hash of a DID document
    Hash {
        /// DID
        id: String,
        /// DIDRegistry contract address
        #[arg(long, env = crate::DID_REGISTRY_VAR)]
        registry: Option<String>,
    },
    /// Show a DID document
    Show {
        /// DID
        id: String,
        /// DIDRegistry contract address
        #[arg(long, env = crate::DID_REGISTRY_VAR)]
        registry: Option<String>,
    },
}

impl DidCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        match self {
            DidCommand::Create { id, registry } => {
                let private_key = ctx.settings.require_private_key()?;
                let registry = ctx.registry(registry.as_deref())?;
                let client = ctx.client().await?;
                let reg = registry::create_did(
                    &client,
                    &ctx.ipfs(),
                    private_key,
                    &id,
                    registry.as_ref(),
                    &ctx.cancel,
                )
                .await?;
                Output::new(ctx.json())
                    .field("did", &reg.did)
                    .field("ipfs_hash", &reg.ipfs_hash)
                    .field("transaction", reg.receipt.transaction_hash)
                    .line(format!("Successfully registered DID: {}", reg.did))
                    .line(format!("DID Document IPFS Hash: {}", reg.ipfs_hash))
                    .line(format!("Transaction address: {}", reg.receipt.transaction_hash))
                    .print();
                Ok(())
            }
            DidCommand::Owner { id, registry } => {
                let registry = ctx.registry(registry.as_deref())?;
                let client = ctx.client().await?;
                let owner = registry::did_owner(&client, registry.as_ref(), &id).await?;
                Output::new(ctx.json())
                    .field("owner", owner)
                    .line(owner.to_string())
                    .print();
                Ok(())
            }
            DidCommand::Hash { id, registry } => {
                let registry = ctx.registry(registry.as_deref())?;
                let client = ctx.client().await?;
                let hash = registry::did_hash(&client, registry.as_ref(), &id).await?;
                Output::new(ctx.json())
                    .field("hash", &hash)
                    .line(hash)
                    .print();
                Ok(())
            }
            DidCommand::Show { id, registry } => {
                let registry = ctx.registry(registry.as_deref())?;
                let client = ctx.client().await?;
                let doc = registry::did_document(&client, &ctx.ipfs(), registry.as_ref(), &id).await?;
                if ctx.json() {
                    return print_json(&doc);
                }
                println!("{}", doc.to_pretty_json()?);
                Ok(())
            }
        }
    }
}
