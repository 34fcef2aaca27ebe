//! Decentralized identifiers and DID documents
//!
//! A DID has the form `did:<method>:<id>[/path][#fragment]`. Methods are
//! lowercase alphanumerics; ids are alphanumerics plus `.`, `-`, `_` and
//! percent escapes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};

use crate::SdkError;

/// Required context for DID documents
pub const CONTEXT_V1: &str = "https://w3id.org/did/v1";

/// Key type of secp256k1 public keys in a document
pub const SECP256K1_KEY_TYPE: &str = "Secp256k1VerificationKey2018";

/// A parsed decentralized identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Did {
    /// Method name, e.g. `go`
    pub method: String,
    /// Method-specific id
    pub id: String,
    /// Unescaped path, including its leading `/`
    pub path: String,
    /// Unescaped fragment, without `#`
    pub fragment: String,
}

impl Did {
    /// Parse a DID string
    pub fn parse(raw: &str) -> Result<Self, SdkError> {
        let rest = raw
            .strip_prefix("did:")
            .ok_or_else(|| parse_error("invalid scheme"))?;

        let (rest, fragment) = match rest.split_once('#') {
            Some((head, fragment)) => (head, fragment),
            None => (rest, ""),
        };
        let (rest, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, ""),
        };

        let (method, id) = parse_method(rest)?;
        let id = parse_id(id)?;

        Ok(Did {
            method: method.to_string(),
            id: id.to_string(),
            path: unescape(path)?,
            fragment: unescape(fragment)?,
        })
    }

    /// The same DID with a different fragment
    pub fn with_fragment(&self, fragment: &str) -> Did {
        Did {
            fragment: fragment.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}{}", self.method, self.id, escape(&self.path, true))?;
        if !self.fragment.is_empty() {
            write!(f, "#{}", escape(&self.fragment, false))?;
        }
        Ok(())
    }
}

impl FromStr for Did {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::parse(s)
    }
}

/// Whether `s` is a non-empty, valid DID id string
pub fn is_valid_id_string(s: &str) -> bool {
    parse_id(s).is_ok()
}

fn parse_error(msg: impl fmt::Display) -> SdkError {
    SdkError::Did(format!("did.Parse(): {}", msg))
}

fn parse_method(s: &str) -> Result<(&str, &str), SdkError> {
    if s.is_empty() {
        return Err(parse_error("missing method"));
    }
    if s.starts_with(':') {
        return Err(parse_error("empty method not allowed"));
    }
    for (i, ch) in s.char_indices() {
        if ch == ':' {
            return Ok((&s[..i], &s[i + 1..]));
        }
        if !is_method_char(ch) {
            return Err(parse_error(format!("invalid method character: {:?}", ch)));
        }
    }
    Err(parse_error("missing id separator"))
}

fn parse_id(s: &str) -> Result<&str, SdkError> {
    if s.is_empty() {
        return Err(parse_error("missing id"));
    }
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i];
        if ch == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return Err(parse_error(format!("invalid id escape: {:?}", &s[i..])));
            }
            i += 3;
            continue;
        }
        if !is_id_char(ch) {
            let ch = s[i..].chars().next().unwrap_or_default();
            return Err(parse_error(format!("invalid id character: {:?}", ch)));
        }
        i += 1;
    }
    Ok(s)
}

fn is_method_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit()
}

fn is_id_char(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, b'.' | b'-' | b'_')
}

/// Bytes escaped in a DID fragment: everything outside unreserved,
/// sub-delims, `:`, `@`, `/` and `?`
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Path escapes also cover `?`
const PATH: &AsciiSet = &FRAGMENT.add(b'?');

fn escape(s: &str, path: bool) -> String {
    let set = if path { PATH } else { FRAGMENT };
    utf8_percent_encode(s, set).to_string()
}

fn unescape(s: &str) -> Result<String, SdkError> {
    // percent_decode_str passes malformed escapes through; reject them first
    if let Some((i, _)) = s.match_indices('%').find(|(i, _)| {
        !s.get(i + 1..i + 3)
            .is_some_and(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
    }) {
        let end = (i + 3).min(s.len());
        return Err(parse_error(format!(
            "invalid URL escape {:?}",
            s.get(i..end).unwrap_or("%")
        )));
    }
    percent_decode_str(s)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(parse_error)
}

/// A DID document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Always [`CONTEXT_V1`]
    #[serde(rename = "@context", default, skip_serializing_if = "String::is_empty")]
    pub context: String,
    /// The DID this document describes
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Public keys of the subject
    #[serde(rename = "publicKey", default, skip_serializing_if = "Vec::is_empty")]
    pub public_keys: Vec<PublicKey>,
    /// Key references (strings) or embedded keys usable for authentication
    #[serde(rename = "authentication", default, skip_serializing_if = "Vec::is_empty")]
    pub authentications: Vec<serde_json::Value>,
    /// Advertised service endpoints
    #[serde(rename = "service", alias = "services", default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<Service>,
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Integrity proof
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<DocumentProof>,
}

impl Document {
    /// Empty document with the required context
    pub fn new() -> Self {
        Self {
            context: CONTEXT_V1.to_string(),
            ..Default::default()
        }
    }

    /// Tab-indented JSON
    pub fn to_pretty_json(&self) -> Result<String, SdkError> {
        tab_indented(self)
    }

    /// Keys of the given type
    pub fn keys_of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a PublicKey> + 'a {
        self.public_keys.iter().filter(move |k| k.kind == kind)
    }
}

pub(crate) fn tab_indented<T: Serialize>(value: &T) -> Result<String, SdkError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    String::from_utf8(buf).map_err(|e| SdkError::Serialization(e.to_string()))
}

/// A public key entry of a DID document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKey {
    /// Key id within the document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Key type, e.g. [`SECP256K1_KEY_TYPE`]
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// DID controlling the key
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub controller: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key_pem: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key_jwk: String,
    /// 0x-prefixed hex, used for secp256k1 keys
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key_hex: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key_base64: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key_base58: String,
    #[allow(missing_docs)]
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key_multibase: String,
}

/// A service endpoint entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service id within the document
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Service type
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Endpoint URL
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_endpoint: String,
}

/// Integrity proof of a DID document
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct DocumentProof {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub nonce: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature_value: String,
}
