//! Contract code generation

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use web3_sdk::generate::{gen_erc20, Erc20Params};
use web3_sdk::units::parse_units;

use super::Context;
use crate::output::Output;
use crate::CliError;

/// Generate subcommands
#[derive(Debug, Subcommand)]
pub enum GenerateCommand {
    /// Generate a contract
    #[command(subcommand)]
    Contract(ContractTemplate),
}

/// Contract templates
#[derive(Debug, Subcommand)]
pub enum ContractTemplate {
    /// OpenZeppelin based ERC20 token
    Erc20(Erc20Args),
}

#[derive(Debug, Args)]
pub struct Erc20Args {
    /// Token symbol, also the contract name
    #[arg(short, long)]
    symbol: String,
    /// Token name
    #[arg(long)]
    name: String,
    /// Token decimals
    #[arg(long, default_value_t = 18)]
    decimals: u8,
    /// Supply cap in whole tokens
    #[arg(long)]
    cap: Option<String>,
    /// Supply minted to the deployer, in whole tokens
    #[arg(long)]
    initial_supply: Option<String>,
    /// Make the token pausable
    #[arg(long)]
    pausable: bool,
    /// Make the token mintable
    #[arg(long)]
    mintable: bool,
    /// Make the token burnable
    #[arg(long)]
    burnable: bool,
    /// Directory the .sol file is written to
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl GenerateCommand {
    pub async fn execute(self, ctx: &Context) -> Result<(), CliError> {
        match self {
            GenerateCommand::Contract(ContractTemplate::Erc20(args)) => {
                let path = write_erc20(&args)?;
                Output::new(ctx.json())
                    .field("file", path.display())
                    .line(format!(
                        "The sample contract has been successfully written to {} file",
                        path.display()
                    ))
                    .print();
                Ok(())
            }
        }
    }
}

impl Erc20Args {
    fn params(&self) -> Result<Erc20Params, CliError> {
        let whole_tokens = |v: &Option<String>| {
            v.as_deref()
                .map(|s| parse_units(s, usize::from(self.decimals)))
                .transpose()
        };
        Ok(Erc20Params {
            symbol: self.symbol.clone(),
            token_name: self.name.clone(),
            cap: whole_tokens(&self.cap)?,
            decimals: self.decimals,
            initial_supply: whole_tokens(&self.initial_supply)?,
            pausable: self.pausable,
            mintable: self.mintable,
            burnable: self.burnable,
        })
    }
}

fn write_erc20(args: &Erc20Args) -> Result<PathBuf, CliError> {
    let source = gen_erc20(&args.params()?)?;
    let dir = args.output.as_deref().unwrap_or_else(|| Path::new(""));
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir)?;
    }
    let path = dir.join(format!("{}.sol", args.symbol));
    std::fs::write(&path, source)
        .map_err(|e| CliError::context(&format!("Cannot write the contract file {:?}", path), e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use web3_sdk::U256;

    fn args(dir: &Path) -> Erc20Args {
        Erc20Args {
            symbol: "GOO".to_string(),
            name: "Goo Token".to_string(),
            decimals: 6,
            cap: Some("1000".to_string()),
            initial_supply: None,
            pausable: true,
            mintable: false,
            burnable: false,
            output: Some(dir.to_path_buf()),
        }
    }

    #[test]
    fn test_cap_in_whole_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let params = args(dir.path()).params().unwrap();
        assert_eq!(params.cap, Some(U256::from(1_000_000_000u64)));
        assert_eq!(params.initial_supply, None);
    }

    #[test]
    fn test_write_erc20() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_erc20(&args(dir.path())).unwrap();
        assert_eq!(path, dir.path().join("GOO.sol"));
        let source = std::fs::read_to_string(path).unwrap();
        assert!(source.contains("contract GOO"));
        assert!(source.contains("ERC20Pausable"));
    }
}
