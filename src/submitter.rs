use log::{debug, error, info};
use web3::types::H256;

use crate::comptroller::Comptroller;
use crate::types::{BorrowersByToken, Result};
use crate::utils::get_chunks;

/// Sends one `claimStrike` per chunk of `batch` borrowers, one token at a time,
/// awaiting each receipt before the next send. The first failure ends the run.
pub async fn claim_batches<C>(
    comptroller: &C,
    borrowers_by_token: &BorrowersByToken,
    batch: usize,
) -> Result<Vec<H256>>
where
    C: Comptroller + ?Sized,
{
    let mut transactions = Vec::new();

    for (s_token, borrowers) in borrowers_by_token {
        for chunk in get_chunks(borrowers, batch)? {
            if chunk.is_empty() {
                info!(
                    "[submitter::claim_batches] No borrowers to claim for {:?}",
                    s_token
                );
                continue;
            }

            info!(
                "[submitter::claim_batches] Sending tx to claim {:?} borrows for {} borrowers",
                s_token,
                chunk.len()
            );
            debug!("[submitter::claim_batches] borrowers: {:?}", chunk);

            match comptroller
                .claim_rewards(chunk.to_vec(), vec![*s_token], true, false)
                .await
            {
                Ok(hash) => {
                    info!("[submitter::claim_batches] TX SUCCEEDED: {:?}", hash);
                    transactions.push(hash);
                }
                Err(e) => {
                    error!("[submitter::claim_batches] TX FAILED: {}", e);
                    return Err(e);
                }
            }
        }
    }

    info!("[submitter::claim_batches] Finished claiming");
    Ok(transactions)
}
