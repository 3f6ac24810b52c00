use std::collections::HashSet;
use std::path::PathBuf;

use log::info;
use web3::types::Address;

use crate::account_filter::filter_borrowers;
use crate::api::AccountApi;
use crate::comptroller::Comptroller;
use crate::config::{ContractTable, RunOptions};
use crate::fixture::{read_fixture, write_fixture};
use crate::init_filter::filter_initialized;
use crate::network::Network;
use crate::submitter::claim_batches;
use crate::types::{BorrowersByToken, Result, RunSummary};
use crate::utils::report;

/// Pool-token seeded with local accounts on a development node.
const DEVELOPMENT_S_TOKEN: &str = "sZRX";

/// Everything resolved before any borrower data is touched.
pub struct RunContext {
    pub network: Network,
    pub options: RunOptions,
    pub contracts: ContractTable,
    pub fixture_dir: PathBuf,
}

/// Synthetic borrowers for a local node: its unlocked accounts 3..7 on sZRX.
pub fn development_borrowers(
    contracts: &ContractTable,
    node_accounts: &[Address],
) -> Result<BorrowersByToken> {
    let s_token = contracts.address(DEVELOPMENT_S_TOKEN)?;
    let borrowers = node_accounts.iter().skip(3).take(4).copied().collect();
    Ok(BorrowersByToken::from([(s_token, borrowers)]))
}

/// Loads accounts from the fixture or the API and groups the target borrowers.
pub async fn remote_borrowers(ctx: &RunContext, api: &AccountApi) -> Result<BorrowersByToken> {
    let accounts = if ctx.options.read_fixture {
        read_fixture(&ctx.fixture_dir, ctx.network).await?
    } else {
        api.fetch_accounts(ctx.network).await?
    };
    info!(
        "[flywheel::remote_borrowers] Loaded {} accounts for {}",
        accounts.len(),
        ctx.network
    );

    let s_token_map = ctx.contracts.resolve_symbols(&ctx.options.s_tokens)?;
    info!("[flywheel::remote_borrowers] Using: {:?}", s_token_map);
    let s_tokens: HashSet<Address> = s_token_map.into_values().collect();

    let borrowers_by_token = filter_borrowers(&accounts, &s_tokens);
    if ctx.options.write_fixture {
        write_fixture(&ctx.fixture_dir, ctx.network, &accounts).await?;
    }
    Ok(borrowers_by_token)
}

/// Filter, claim, then filter the unnarrowed borrower set again to verify.
pub async fn run<C>(
    comptroller: &C,
    borrowers_by_token: &BorrowersByToken,
    batch: usize,
) -> Result<RunSummary>
where
    C: Comptroller + ?Sized,
{
    let uninitialized_before = filter_initialized(comptroller, borrowers_by_token).await?;
    report("Uninitialized accounts before:", &uninitialized_before);

    let transactions = claim_batches(comptroller, &uninitialized_before, batch).await?;

    let uninitialized_after = filter_initialized(comptroller, borrowers_by_token).await?;
    report("Uninitialized accounts after:", &uninitialized_after);

    Ok(RunSummary {
        uninitialized_before,
        transactions,
        uninitialized_after,
    })
}
