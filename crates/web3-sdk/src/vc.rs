//! Verifiable credentials signed with secp256k1 keys
//!
//! A credential is hashed as its compact JSON encoding (without the proof)
//! followed by a newline, using keccak-256. The proof value is the 64-byte
//! `r || s` signature of that hash as unprefixed hex.

use std::io;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use web3_crypto::{keccak256, verify_compact};
use web3_primitives::{strip_0x, H256};

use crate::did::{tab_indented, Did, Document, SECP256K1_KEY_TYPE};
use crate::{SdkError, Wallet};

/// Base context of credentials and presentations
pub const CREDENTIALS_CONTEXT_V1: &str = "https://www.w3.org/2018/credentials/v1";

/// One or more claims made by the same issuer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[allow(missing_docs)]
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// `VerifiableCredential` followed by the credential's own type
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    /// Issuer DID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<DateTime<Utc>>,
    /// Claims about the subject; the subject DID is under `id`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub credential_subject: Map<String, Value>,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    /// Empty credential with the default context and type
    pub fn new() -> Self {
        Self {
            context: vec![CREDENTIALS_CONTEXT_V1.to_string()],
            types: vec!["VerifiableCredential".to_string()],
            ..Default::default()
        }
    }

    /// Build an unsigned credential about `subject_id`.
    ///
    /// The issuance date is truncated to whole seconds.
    pub fn issue(
        id: &str,
        kind: &str,
        issuer: &str,
        subject_id: &str,
        mut claims: Map<String, Value>,
        issued_at: DateTime<Utc>,
    ) -> Result<Self, SdkError> {
        if id.is_empty() {
            return Err(SdkError::Did("Credential ID required".to_string()));
        }
        if kind.is_empty() {
            return Err(SdkError::Did("Credential type required".to_string()));
        }
        if issuer.is_empty() {
            return Err(SdkError::Did("Credential issuer DID required".to_string()));
        }
        Did::parse(issuer)
            .map_err(|e| SdkError::Did(format!("Invalid credential issuer DID: {}", e)))?;
        if subject_id.is_empty() {
            return Err(SdkError::Did("Credential subject DID required".to_string()));
        }
        Did::parse(subject_id)
            .map_err(|e| SdkError::Did(format!("Invalid credential subject DID: {}", e)))?;

        claims.insert("id".to_string(), Value::String(subject_id.to_string()));

        let mut cred = Self::new();
        cred.id = id.to_string();
        cred.types.push(kind.to_string());
        cred.issuer = issuer.to_string();
        cred.issuance_date = Some(issued_at.trunc_subsecs(0));
        cred.credential_subject = claims;
        Ok(cred)
    }

    /// Keccak-256 of the proof-less JSON encoding plus a trailing newline
    pub fn signing_hash(&self) -> Result<H256, SdkError> {
        let unsigned = Self {
            proof: None,
            ..self.clone()
        };
        let mut buf = to_go_json(&unsigned)?;
        buf.push(b'\n');
        Ok(keccak256(&buf))
    }

    /// DID of the subject, if set
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject.get("id").and_then(Value::as_str)
    }

    /// Claims other than the subject id, sorted by key
    pub fn claims(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.credential_subject.iter().filter(|(k, _)| k.as_str() != "id")
    }

    /// Tab-indented JSON
    pub fn to_pretty_json(&self) -> Result<String, SdkError> {
        tab_indented(self)
    }
}

/// A set of credentials presented together
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct VerifiablePresentation {
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verifiable_credential: Vec<VerifiableCredential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiablePresentation {
    /// Empty presentation with the default context and type
    pub fn new() -> Self {
        Self {
            context: vec![CREDENTIALS_CONTEXT_V1.to_string()],
            types: vec!["VerifiablePresentation".to_string()],
            ..Default::default()
        }
    }
}

/// Signature over a credential or presentation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Always `Secp256k1VerificationKey2018` for proofs made here
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Verification method (key id) that made the proof
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator: String,
    /// Unprefixed hex of `r || s`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proof_value: String,
}

/// Sign `cred` in place, replacing any existing proof.
///
/// `verification_method` is recorded as the proof creator when non-empty.
pub fn sign_credential(
    cred: &mut VerifiableCredential,
    verification_method: &str,
    wallet: &Wallet,
) -> Result<(), SdkError> {
    let hash = cred.signing_hash()?;
    let signature = wallet
        .sign_hash(&hash)
        .map_err(|e| SdkError::Did(format!("Cannot sign credential: {}", e)))?;

    cred.proof = Some(Proof {
        kind: SECP256K1_KEY_TYPE.to_string(),
        created: cred.issuance_date.or_else(|| Some(Utc::now().trunc_subsecs(0))),
        creator: verification_method.to_string(),
        proof_value: hex::encode(signature.to_compact()),
    });
    Ok(())
}

/// Whether any secp256k1 key of `doc` verifies the credential's proof.
///
/// A credential without a proof does not verify.
pub fn verify_credential(cred: &VerifiableCredential, doc: &Document) -> Result<bool, SdkError> {
    let Some(proof) = &cred.proof else {
        return Ok(false);
    };
    let Ok(signature) = hex::decode(strip_0x(&proof.proof_value)) else {
        return Ok(false);
    };
    let hash = cred.signing_hash()?;

    let verified = doc.keys_of_type(SECP256K1_KEY_TYPE).any(|key| {
        hex::decode(strip_0x(&key.public_key_hex))
            .map(|pubkey| verify_compact(&pubkey, &hash, &signature))
            .unwrap_or(false)
    });
    tracing::debug!(issuer = %cred.issuer, verified, "verified credential");
    Ok(verified)
}

/// Compact JSON with `<`, `>`, `&`, U+2028 and U+2029 escaped, matching
/// the encoding other GoChain tools hash.
fn to_go_json<T: Serialize>(value: &T) -> Result<Vec<u8>, SdkError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, HtmlSafeFormatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

struct HtmlSafeFormatter;

impl serde_json::ser::Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escaped = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escaped.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}
