use log::{debug, info};

use crate::types::{BorrowersByToken, FlywheelError, Result};

/// Splits `src` into consecutive slices of at most `chunk_size` elements.
///
/// An empty input yields a single empty chunk, which callers treat as
/// "nothing to do" for that token.
pub fn get_chunks<T>(src: &[T], chunk_size: usize) -> Result<Vec<&[T]>> {
    if chunk_size == 0 {
        return Err(FlywheelError::InvalidArgument(
            "chunk size can't be 0".to_string(),
        ));
    }
    if src.is_empty() {
        return Ok(vec![src]);
    }
    Ok(src.chunks(chunk_size).collect())
}

pub fn report(label: &str, borrowers_by_token: &BorrowersByToken) {
    let total: usize = borrowers_by_token.values().map(Vec::len).sum();
    info!(
        "{} {} borrowers across {} pool-tokens",
        label,
        total,
        borrowers_by_token.len()
    );
    for (token, borrowers) in borrowers_by_token {
        info!("    {:?}: {}", token, borrowers.len());
    }
    match serde_json::to_string_pretty(borrowers_by_token) {
        Ok(json) => debug!("{} {}", label, json),
        Err(e) => debug!("{} <unprintable: {}>", label, e),
    }
}
