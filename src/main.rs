use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use env_logger::Env;
use log::info;
use web3::signing::SecretKey;

mod account_filter;
mod api;
mod comptroller;
mod config;
mod fixture;
mod flywheel;
mod init_filter;
mod network;
mod submitter;
mod types;
mod utils;

use crate::api::AccountApi;
use crate::comptroller::{Signer, Web3Comptroller};
use crate::config::{parse_address, print_usage, ContractTable, RunOptions};
use crate::flywheel::{development_borrowers, remote_borrowers, RunContext};
use crate::network::Network;
use crate::types::{FlywheelError, Result};
use crate::utils::report;

/// Initializes reward accrual for borrowers that have never had it set.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// development, mainnet, kovan, ropsten, goerli or rinkeby
    #[arg(short, long, env)]
    network: String,

    #[arg(short = 'u', long, env, default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Unlocked node account to send claims from
    #[arg(long, env = "FROM_ADDRESS")]
    from: Option<String>,

    /// Hex key to sign claims locally instead of using a node account
    #[arg(long, env, hide_env_values = true)]
    private_key: Option<String>,

    /// Directory with `{network}.json` contract tables
    #[arg(long, env, default_value = "networks")]
    networks_dir: PathBuf,

    #[arg(long, env, default_value = "fixture")]
    fixture_dir: PathBuf,

    #[arg(long, default_value_t = 1)]
    confirmations: usize,

    #[arg(long)]
    gas_limit: Option<u64>,

    #[arg(long, short, default_value_t = false)]
    verbose: bool,

    /// Run options as JSON, e.g. '{"batch": 200, "sTokens": ["sDAI"]}'
    config: Option<String>,
}

async fn resolve_signer(args: &Args, comptroller: &Web3Comptroller) -> Result<Signer> {
    if let Some(key) = &args.private_key {
        let key = SecretKey::from_str(key.trim().trim_start_matches("0x"))
            .map_err(|e| FlywheelError::InvalidArgument(format!("bad private key: {}", e)))?;
        return Ok(Signer::Local(key));
    }
    if let Some(from) = &args.from {
        return Ok(Signer::Node(parse_address(from)?));
    }
    let accounts = comptroller.node_accounts().await?;
    accounts.first().copied().map(Signer::Node).ok_or_else(|| {
        FlywheelError::InvalidArgument(
            "node has no unlocked accounts; pass --from or --private-key".to_string(),
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();
    info!("[main] Starting up...");

    let options = RunOptions::parse(args.config.as_deref())?;
    info!("[main] Running with actual args: {:?}", options);

    let network = Network::from_str(&args.network).map_err(|e| {
        print_usage();
        e
    })?;

    let contracts = ContractTable::load(&args.networks_dir, network).await?;
    let comptroller = Web3Comptroller::new(&args.rpc_url, contracts.comptroller()?)?
        .with_confirmations(args.confirmations)
        .with_gas_limit(args.gas_limit);
    let signer = resolve_signer(&args, &comptroller).await?;
    let comptroller = comptroller.with_signer(signer);

    let ctx = RunContext {
        network,
        options,
        contracts,
        fixture_dir: args.fixture_dir.clone(),
    };

    let borrowers_by_token = if network.is_development() {
        let node_accounts = comptroller.node_accounts().await?;
        development_borrowers(&ctx.contracts, &node_accounts)?
    } else {
        let api = AccountApi::new(ctx.options.stage);
        remote_borrowers(&ctx, &api).await?
    };
    report("Borrowers by pool-token:", &borrowers_by_token);

    let summary = flywheel::run(&comptroller, &borrowers_by_token, ctx.options.batch).await?;

    let count = |map: &types::BorrowersByToken| map.values().map(Vec::len).sum::<usize>();
    info!(
        "[main] {} borrowers were uninitialized, sent {} transactions, {} still uninitialized. Exiting.",
        count(&summary.uninitialized_before),
        summary.transactions.len(),
        count(&summary.uninitialized_after)
    );
    Ok(())
}
