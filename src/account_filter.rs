use std::collections::HashSet;

use web3::types::Address;

use crate::types::{AccountRecord, BorrowersByToken};

/// Groups borrowers by pool-token, keeping only target tokens with a positive
/// borrow balance. Order follows the input; nothing is deduplicated.
pub fn filter_borrowers(
    accounts: &[AccountRecord],
    s_tokens: &HashSet<Address>,
) -> BorrowersByToken {
    let mut borrowers_by_token = BorrowersByToken::new();
    for account in accounts {
        for position in &account.tokens {
            if s_tokens.contains(&position.address)
                && position.borrow_balance_underlying.value.is_positive()
            {
                borrowers_by_token
                    .entry(position.address)
                    .or_default()
                    .push(account.address);
            }
        }
    }
    borrowers_by_token
}
