//! Solidity source generation for standard token contracts

use std::fmt::Write;

use web3_primitives::U256;

use crate::SdkError;

const OZ_ERC20: &str = "./lib/oz/contracts/token/ERC20";

/// Options of a generated ERC20 token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Erc20Params {
    /// Token symbol, also used as the contract name
    pub symbol: String,
    /// Human readable token name
    pub token_name: String,
    /// Maximum supply in the token's smallest unit
    pub cap: Option<U256>,
    #[allow(missing_docs)]
    pub decimals: u8,
    /// Supply minted to the deployer, in the token's smallest unit
    pub initial_supply: Option<U256>,
    #[allow(missing_docs)]
    pub pausable: bool,
    #[allow(missing_docs)]
    pub mintable: bool,
    #[allow(missing_docs)]
    pub burnable: bool,
}

/// Render an OpenZeppelin 2.x ERC20 contract
pub fn gen_erc20(params: &Erc20Params) -> Result<String, SdkError> {
    if params.symbol.is_empty() {
        return Err(SdkError::Compiler("Symbol is required".to_string()));
    }
    if params.token_name.is_empty() {
        return Err(SdkError::Compiler("Name is required".to_string()));
    }
    if !is_identifier(&params.symbol) {
        return Err(SdkError::Compiler(format!(
            "Symbol {:?} is not a valid contract name",
            params.symbol
        )));
    }

    let mut imports = String::from("pragma solidity ^0.5.2;\n\n");
    let mut bases = Vec::new();
    let mut ctor = format!(
        "    constructor() ERC20Detailed(\"{}\", \"{}\", {})",
        escape_string(&params.token_name),
        escape_string(&params.symbol),
        params.decimals
    );

    let _ = writeln!(imports, "import \"{}/ERC20Detailed.sol\";", OZ_ERC20);
    let extensions = [
        (params.pausable, "ERC20Pausable"),
        (params.burnable, "ERC20Burnable"),
        (params.mintable, "ERC20Mintable"),
        (params.cap.is_some(), "ERC20Capped"),
    ];
    for (enabled, name) in extensions {
        if enabled {
            let _ = writeln!(imports, "import \"{}/{}.sol\";", OZ_ERC20, name);
            bases.push(name);
        }
    }
    if let Some(cap) = params.cap {
        let _ = write!(ctor, " ERC20Capped({})", cap);
    }
    bases.push("ERC20Detailed");

    let body = match params.initial_supply {
        Some(supply) if !supply.is_zero() => {
            format!(" public {{\n        _mint(msg.sender, {});\n    }}\n", supply)
        }
        _ => " public {}\n".to_string(),
    };

    Ok(format!(
        "{}\ncontract {} is {} {{\n\n{}{}\n}}\n",
        imports,
        params.symbol,
        bases.join(", "),
        ctor,
        body
    ))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
