use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use log::{error, info};
use serde::Deserialize;
use serde_json::{Map, Value};
use web3::types::Address;

use crate::network::Network;
use crate::types::{FlywheelError, Result};

pub const DEFAULT_BATCH: usize = 100;

pub const ALL_S_TOKENS: [&str; 9] = [
    "sUSDC", "sDAI", "sUSDT", "sBAT", "sETH", "sSAI", "sREP", "sZRX", "sWBTC",
];

pub const USAGE: &str = r#"
usage:
    flywheel_init --network {network} --rpc-url {url} '{
        "batch": number || null,        // how many borrowers to claim for at once. default 100 (~2.3M gas)
        "stage": bool || null,          // use stage API? default false
        "sTokens": string[] || null,    // which borrowers to get. defaults to all sTokens
        "readFixture": bool || null,    // read from saved response? default false
        "writeFixture": bool || null    // save api response? default false
    }'

example:

    flywheel_init --network rinkeby --rpc-url http://localhost:8545 '{"batch": "200"}'

networks: development, mainnet, kovan, ropsten, goerli, rinkeby
"#;

pub fn print_usage() {
    write_usage(&mut std::io::stdout());
}

fn write_usage<W: Write>(out: &mut W) {
    let _ = writeln!(out, "{}", USAGE);
}

/// Options for one run, resolved once from the positional argument blob.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub batch: usize,
    pub stage: bool,
    pub s_tokens: Vec<String>,
    pub read_fixture: bool,
    pub write_fixture: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch: DEFAULT_BATCH,
            stage: false,
            s_tokens: ALL_S_TOKENS.iter().map(|s| s.to_string()).collect(),
            read_fixture: false,
            write_fixture: false,
        }
    }
}

impl RunOptions {
    /// Parses the argument blob. Malformed input prints usage and is terminal.
    pub fn parse(config_args: Option<&str>) -> Result<Self> {
        Self::parse_with_usage(config_args, &mut std::io::stdout())
    }

    fn parse_with_usage<W: Write>(config_args: Option<&str>, usage_out: &mut W) -> Result<Self> {
        Self::resolve(config_args).map_err(|e| {
            write_usage(usage_out);
            error!("[RunOptions::parse] {}", e);
            e
        })
    }

    fn resolve(config_args: Option<&str>) -> Result<Self> {
        let raw = match config_args.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        let value: Value = serde_json::from_str(raw)
            .map_err(|e| FlywheelError::Config(format!("could not parse `{}`: {}", raw, e)))?;
        let config = match value {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(FlywheelError::Config(format!(
                    "expected a JSON object, got `{}`",
                    other
                )));
            }
        };

        let defaults = Self::default();
        let batch = match get_number(&config, "batch")? {
            None | Some(0) => defaults.batch,
            Some(n) if n < 0 => {
                return Err(FlywheelError::InvalidArgument(format!(
                    "batch must be positive, got {}",
                    n
                )))
            }
            Some(n) => n as usize,
        };
        let s_tokens = match get_array(&config, "sTokens")? {
            Some(list) if !list.is_empty() => list,
            _ => defaults.s_tokens,
        };

        Ok(Self {
            batch,
            stage: get_boolean(&config, "stage")?.unwrap_or(defaults.stage),
            s_tokens,
            read_fixture: get_boolean(&config, "readFixture")?.unwrap_or(defaults.read_fixture),
            write_fixture: get_boolean(&config, "writeFixture")?.unwrap_or(defaults.write_fixture),
        })
    }
}

fn get_number(config: &Map<String, Value>, key: &str) -> Result<Option<i64>> {
    let invalid = |v: &Value| {
        FlywheelError::InvalidArgument(format!("{} must be an integer, got {}", key, v))
    };
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Some(i)),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 => Ok(Some(f as i64)),
                _ => Err(invalid(v)),
            },
        },
        Some(v @ Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| invalid(v)),
        Some(v) => Err(invalid(v)),
    }
}

fn get_boolean(config: &Map<String, Value>, key: &str) -> Result<Option<bool>> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(v) => Err(FlywheelError::InvalidArgument(format!(
            "{} must be a boolean, got {}",
            key, v
        ))),
    }
}

fn get_array(config: &Map<String, Value>, key: &str) -> Result<Option<Vec<String>>> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        )),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                other => Err(FlywheelError::InvalidArgument(format!(
                    "{} entries must be strings, got {}",
                    key, other
                ))),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(v) => Err(FlywheelError::InvalidArgument(format!(
            "{} must be a list of strings, got {}",
            key, v
        ))),
    }
}

#[derive(Debug, Deserialize)]
struct NetworkFile {
    #[serde(rename = "Contracts", default)]
    contracts: HashMap<String, String>,
}

/// Deployed contract addresses for one network, read from `{dir}/{network}.json`.
#[derive(Debug, Clone)]
pub struct ContractTable {
    network: Network,
    contracts: HashMap<String, String>,
}

impl ContractTable {
    pub async fn load(dir: &Path, network: Network) -> Result<Self> {
        let path = dir.join(format!("{}.json", network.name()));
        info!("[ContractTable::load] Reading {}", path.display());
        let text = tokio::fs::read_to_string(&path).await?;
        Self::from_json(network, &text)
    }

    pub fn from_json(network: Network, text: &str) -> Result<Self> {
        let file: NetworkFile = serde_json::from_str(text)?;
        Ok(Self {
            network,
            contracts: file.contracts,
        })
    }

    pub fn address(&self, name: &str) -> Result<Address> {
        let raw = self
            .contracts
            .get(name)
            .ok_or_else(|| FlywheelError::UnknownSymbol {
                network: self.network.to_string(),
                symbol: name.to_string(),
            })?;
        parse_address(raw)
    }

    pub fn comptroller(&self) -> Result<Address> {
        self.address("Comptroller")
    }

    /// Symbol -> address for every requested pool-token.
    pub fn resolve_symbols(&self, symbols: &[String]) -> Result<BTreeMap<String, Address>> {
        symbols
            .iter()
            .map(|symbol| Ok((symbol.clone(), self.address(symbol)?)))
            .collect()
    }
}

pub fn parse_address(raw: &str) -> Result<Address> {
    let hex = raw.trim();
    Address::from_str(hex.strip_prefix("0x").unwrap_or(hex))
        .map_err(|e| FlywheelError::InvalidArgument(format!("bad address `{}`: {}", raw, e)))
}
