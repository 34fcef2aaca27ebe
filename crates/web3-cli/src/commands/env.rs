//! `web3 env`

use super::Context;
use crate::output::print_json;
use crate::CliError;

/// Environment variables the CLI reads, with values set in this process
pub fn web3_vars() -> Vec<(String, String)> {
    let mut vars: Vec<(String, String)> = std::env::vars()
        .filter(|(k, _)| k.starts_with("WEB3_"))
        .collect();
    vars.sort();
    vars
}

pub fn execute(ctx: &Context) -> Result<(), CliError> {
    let vars = web3_vars();
    if ctx.json() {
        let map: serde_json::Map<String, serde_json::Value> = vars
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        return print_json(&map);
    }
    for (k, v) in vars {
        println!("{}={}", k, v);
    }
    Ok(())
}
