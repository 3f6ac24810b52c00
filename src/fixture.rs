use std::path::{Path, PathBuf};

use log::info;

use crate::network::Network;
use crate::types::{AccountRecord, Result};

pub fn fixture_path(dir: &Path, network: Network) -> PathBuf {
    dir.join(format!("{}_borrowers.json", network.name()))
}

pub async fn read_fixture(dir: &Path, network: Network) -> Result<Vec<AccountRecord>> {
    let path = fixture_path(dir, network);
    info!("[fixture::read_fixture] Reading {}", path.display());
    let text = tokio::fs::read_to_string(&path).await?;
    Ok(serde_json::from_str(&text)?)
}

pub async fn write_fixture(dir: &Path, network: Network, accounts: &[AccountRecord]) -> Result<()> {
    let path = fixture_path(dir, network);
    info!(
        "[fixture::write_fixture] Writing {} accounts to {}",
        accounts.len(),
        path.display()
    );
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, serde_json::to_string(accounts)?).await?;
    Ok(())
}
