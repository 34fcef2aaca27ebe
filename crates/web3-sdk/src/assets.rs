//! Bundled contract ABIs and ABI lookup

use std::path::Path;

use tracing::debug;

use crate::abi::Abi;
use crate::SdkError;

/// ABI of a standard ERC20 token
pub const ERC20_ABI: &str = include_str!("../assets/erc20.json");

/// ABI of a standard ERC721 token
pub const ERC721_ABI: &str = include_str!("../assets/erc721.json");

/// ABI of the DID registry contract
pub const DID_REGISTRY_ABI: &str = include_str!("../assets/did_registry.json");

/// Bundled ABI by name (`erc20`, `erc721` or `did_registry`)
pub fn builtin_abi(name: &str) -> Option<Result<Abi, SdkError>> {
    let json = match name {
        "erc20" => ERC20_ABI,
        "erc721" => ERC721_ABI,
        "did_registry" => DID_REGISTRY_ABI,
        _ => return None,
    };
    Some(Abi::from_json(json))
}

/// Resolve an ABI from a bundled name, a local file, or an `http(s)` URL,
/// tried in that order.
pub async fn get_abi(name_or_path_or_url: &str) -> Result<Abi, SdkError> {
    if let Some(abi) = builtin_abi(name_or_path_or_url) {
        return abi.map_err(|e| {
            SdkError::Serialization(format!("cannot get ABI from the bundled storage: {}", e))
        });
    }

    let path = Path::new(name_or_path_or_url);
    match tokio::fs::read_to_string(path).await {
        Ok(json) => return Abi::from_json(&json),
        Err(e) => debug!(path = %path.display(), error = %e, "ABI is not a readable file"),
    }

    abi_from_url(name_or_path_or_url).await
}

async fn abi_from_url(url: &str) -> Result<Abi, SdkError> {
    let resp = reqwest::get(url)
        .await
        .map_err(|e| SdkError::Transport(format!("error getting ABI: {}", e)))?;
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| SdkError::Transport(format!("error getting ABI: {}", e)))?;
    if !status.is_success() {
        return Err(SdkError::Transport(format!(
            "error getting ABI {}: {}",
            status.as_u16(),
            body
        )));
    }
    Abi::from_json(&body)
}
