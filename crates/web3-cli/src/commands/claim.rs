//! Verifiable credential commands

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use serde_json::{json, Map, Value};
use web3_sdk::did::Did;
use web3_sdk::registry;
use web3_sdk::vc::{sign_credential, verify_credential, VerifiableCredential};
use web3_sdk::Wallet;

use super::Context;
use crate::output::{display_value, Output};
use crate::CliError;

/// Claim subcommands
#[derive(Debug, Subcommand)]
pub enum ClaimCommand {
    /// Issue and sign a verifiable credential
    Sign {
        /// Credential ID
        #[arg(long)]
        id: String,
        /// Credential type
        #[arg(long = "type")]
        kind: String,
        /// Issuer DID
        #[arg(long)]
        issuer: String,
        /// Subject DID
        #[arg(long)]
        subject: String,
        /// Claims as a JSON object
        #[arg(long)]
        data: Option<String>,
    },
    /// Verify a signed credential against its issuer's DID document
    Verify {
        /// Credential file
        file: PathBuf,
        /// DIDRegistry contract address
        #[arg(long, env = crate::DID_REGISTRY_VAR)]
        registry: Option<String>,
    },
}

impl ClaimCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        match self {
            ClaimCommand::Sign {
                id,
                kind,
                issuer,
                subject,
                data,
            } => {
                let wallet = Wallet::from_private_key(ctx.settings.require_private_key()?)?;
                let cred = sign(&wallet, &id, &kind, &issuer, &subject, data.as_deref())?;
                println!("{}", cred.to_pretty_json()?);
                Ok(())
            }
            ClaimCommand::Verify { file, registry } => verify(ctx, &file, registry.as_deref()).await,
        }
    }
}

fn sign(
    wallet: &Wallet,
    id: &str,
    kind: &str,
    issuer: &str,
    subject: &str,
    data: Option<&str>,
) -> Result<VerifiableCredential, CliError> {
    let claims = match data.filter(|d| !d.is_empty()) {
        Some(data) => serde_json::from_str::<Map<String, Value>>(data).map_err(|e| {
            CliError::InvalidInput(format!("Cannot parse subject JSON data: {}", e))
        })?,
        None => Map::new(),
    };

    let mut cred = VerifiableCredential::issue(id, kind, issuer, subject, claims, Utc::now())?;
    let method = Did::parse(issuer)?.with_fragment("owner");
    sign_credential(&mut cred, &method.to_string(), wallet)?;
    Ok(cred)
}

async fn verify(ctx: &Context, file: &Path, registry: Option<&str>) -> Result<(), CliError> {
    let data = std::fs::read(file).map_err(|e| CliError::context("Cannot read file", e))?;
    let cred: VerifiableCredential = serde_json::from_slice(&data)
        .map_err(|e| CliError::context("Cannot decode credential", e))?;

    let registry = ctx.registry(registry)?;
    let client = ctx.client().await?;
    let doc = registry::did_document(&client, &ctx.ipfs(), registry.as_ref(), &cred.issuer)
        .await
        .map_err(|e| CliError::context("Cannot read issuer DID document", e))?;

    let verified = verify_credential(&cred, &doc)?;
    if !verified {
        Output::new(ctx.json())
            .field_value("verified", json!(false))
            .line("Status: NOT VERIFIED")
            .print();
        return Err(CliError::NotVerified);
    }

    let claims: Map<String, Value> = cred.claims().map(|(k, v)| (k.clone(), v.clone())).collect();
    let issued = cred
        .issuance_date
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();
    let mut out = Output::new(ctx.json())
        .field_value("verified", json!(true))
        .field("id", &cred.id)
        .field_value("type", json!(cred.types))
        .field("subject", cred.subject_id().unwrap_or_default())
        .field("issuer", &cred.issuer)
        .field("issued", &issued)
        .field_value("claims", Value::Object(claims.clone()))
        .line(format!("ID:      {}", cred.id))
        .line(format!("Type:    {}", cred.types.join(", ")))
        .line("Status:  VERIFIED")
        .line("")
        .line(format!("Subject:   {}", cred.subject_id().unwrap_or_default()))
        .line(format!("Issuer:    {}", cred.issuer))
        .line(format!("Issued On: {}", issued))
        .line("")
        .line("CLAIMS:");
    for (k, v) in &claims {
        out = out.line(format!("{}: {}", k, display_value(v)));
    }
    out.line("").print();
    Ok(())
}
