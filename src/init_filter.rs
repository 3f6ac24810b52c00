use futures::future::try_join_all;
use log::{error, info};

use crate::comptroller::Comptroller;
use crate::types::{BorrowersByToken, FlywheelError, Result};
use crate::utils::get_chunks;

/// Index queries in flight at once, per pool-token.
pub const INDEX_QUERY_BATCH: usize = 75;

/// Narrows `borrowers_by_token` to borrowers whose accrual index is still zero.
///
/// Pool-tokens with a zero reward speed are dropped entirely. Tokens and chunks
/// are walked one after another; queries within a chunk run concurrently, and the
/// first failure aborts the whole pass.
pub async fn filter_initialized<C>(
    comptroller: &C,
    borrowers_by_token: &BorrowersByToken,
) -> Result<BorrowersByToken>
where
    C: Comptroller + ?Sized,
{
    info!(
        "[init_filter::filter_initialized] Calling strikeBorrowerIndex for borrowers in batches of {}...",
        INDEX_QUERY_BATCH
    );

    let mut uninitialized = BorrowersByToken::new();
    for (s_token, borrowers) in borrowers_by_token {
        let speed = comptroller.reward_speed(*s_token).await?;
        if speed.is_zero() {
            info!(
                "[init_filter::filter_initialized] {:?} has no reward speed, skipping",
                s_token
            );
            continue;
        }

        for chunk in get_chunks(borrowers, INDEX_QUERY_BATCH)? {
            let indices = try_join_all(
                chunk
                    .iter()
                    .map(|borrower| comptroller.borrower_index(*s_token, *borrower)),
            )
            .await
            .map_err(|e| {
                error!("[init_filter::filter_initialized] Web3 calls failed with {}", e);
                FlywheelError::ReadCallsFailed(e.to_string())
            })?;

            uninitialized.entry(*s_token).or_default().extend(
                chunk
                    .iter()
                    .zip(indices)
                    .filter(|(_, index)| index.is_zero())
                    .map(|(borrower, _)| *borrower),
            );
        }
    }

    Ok(uninitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comptroller::mock::MockComptroller;
    use web3::types::Address;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[tokio::test]
    async fn test_zero_index_retained_nonzero_excluded() {
        let s_token = addr(0x71);
        let comptroller = MockComptroller::default()
            .with_speed(s_token, 10)
            .with_index(s_token, addr(2), 1_000_000)
            .with_index(s_token, addr(4), 1);
        let input = BorrowersByToken::from([(s_token, vec![addr(1), addr(2), addr(3), addr(4)])]);

        let result = filter_initialized(&comptroller, &input).await.unwrap();
        assert_eq!(result[&s_token], vec![addr(1), addr(3)]);
    }

    #[tokio::test]
    async fn test_zero_speed_token_skipped() {
        let live = addr(0x71);
        let dormant = addr(0x72);
        let comptroller = MockComptroller::default().with_speed(live, 10);
        let input = BorrowersByToken::from([
            (live, vec![addr(1)]),
            (dormant, vec![addr(1), addr(2)]),
        ]);

        let result = filter_initialized(&comptroller, &input).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[&live], vec![addr(1)]);
        assert!(!result.contains_key(&dormant));
        assert_eq!(*comptroller.index_queries.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_large_lists_are_queried_in_full_and_in_order() {
        let s_token = addr(0x71);
        let borrowers: Vec<Address> = (1..=200).map(addr).collect();
        let mut comptroller = MockComptroller::default().with_speed(s_token, 1);
        for borrower in borrowers.iter().step_by(2) {
            comptroller = comptroller.with_index(s_token, *borrower, 7);
        }
        let input = BorrowersByToken::from([(s_token, borrowers.clone())]);

        let result = filter_initialized(&comptroller, &input).await.unwrap();
        let expected: Vec<Address> = borrowers.iter().skip(1).step_by(2).copied().collect();
        assert_eq!(result[&s_token], expected);
        assert_eq!(*comptroller.index_queries.lock().unwrap(), 200);
    }

    #[tokio::test]
    async fn test_query_failure_aborts() {
        let s_token = addr(0x71);
        let mut comptroller = MockComptroller::default().with_speed(s_token, 1);
        comptroller.failing_borrowers.insert(addr(3));
        let input = BorrowersByToken::from([(s_token, vec![addr(1), addr(2), addr(3)])]);

        let err = filter_initialized(&comptroller, &input).await.unwrap_err();
        assert!(matches!(err, FlywheelError::ReadCallsFailed(_)));
    }

    #[tokio::test]
    async fn test_repeated_runs_agree() {
        let s_token = addr(0x71);
        let comptroller = MockComptroller::default()
            .with_speed(s_token, 3)
            .with_index(s_token, addr(1), 9);
        let input = BorrowersByToken::from([(s_token, vec![addr(1), addr(2), addr(2)])]);

        let first = filter_initialized(&comptroller, &input).await.unwrap();
        let second = filter_initialized(&comptroller, &input).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[&s_token], vec![addr(2), addr(2)]);
    }
}
