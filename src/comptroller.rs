use async_trait::async_trait;
use log::info;
use web3::contract::{Contract, Options};
use web3::signing::{SecretKey, SecretKeyRef};
use web3::transports::Http;
use web3::types::{Address, H256, U256, U64};
use web3::Web3;

use crate::types::{FlywheelError, Result};

/// `strikeSpeeds`, `strikeBorrowerIndex` and the batched `claimStrike`.
const COMPTROLLER_ABI: &[u8] = include_bytes!("../abi/comptroller.json");

/// The reward-distribution contract, as far as this tool needs it.
#[async_trait]
pub trait Comptroller: Send + Sync {
    /// Current per-block reward rate for a pool-token. Zero means rewards are off.
    async fn reward_speed(&self, s_token: Address) -> Result<U256>;

    /// The borrower's accrual checkpoint for a pool-token. Zero means never initialized.
    async fn borrower_index(&self, s_token: Address, borrower: Address) -> Result<U256>;

    /// Sends one claim transaction and waits for its receipt.
    async fn claim_rewards(
        &self,
        holders: Vec<Address>,
        s_tokens: Vec<Address>,
        borrowers: bool,
        suppliers: bool,
    ) -> Result<H256>;
}

/// Who pays for and signs claim transactions.
pub enum Signer {
    /// Sign locally with this key.
    Local(SecretKey),
    /// Account unlocked on the node.
    Node(Address),
}

pub struct Web3Comptroller {
    web3: Web3<Http>,
    contract: Contract<Http>,
    signer: Option<Signer>,
    confirmations: usize,
    gas_limit: Option<U256>,
}

impl Web3Comptroller {
    pub fn new(rpc_endpoint: &str, address: Address) -> Result<Self> {
        let transport = Http::new(rpc_endpoint)?;
        let web3 = Web3::new(transport);
        let abi = ethabi::Contract::load(COMPTROLLER_ABI)?;
        let contract = Contract::new(web3.eth(), address, abi);

        info!(
            "[Web3Comptroller::new] Comptroller {:?} via {}",
            address, rpc_endpoint
        );

        Ok(Self {
            web3,
            contract,
            signer: None,
            confirmations: 1,
            gas_limit: None,
        })
    }

    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: Option<u64>) -> Self {
        self.gas_limit = gas_limit.map(U256::from);
        self
    }

    /// Accounts unlocked on the connected node.
    pub async fn node_accounts(&self) -> Result<Vec<Address>> {
        Ok(self.web3.eth().accounts().await?)
    }
}

#[async_trait]
impl Comptroller for Web3Comptroller {
    async fn reward_speed(&self, s_token: Address) -> Result<U256> {
        let speed: U256 = self
            .contract
            .query("strikeSpeeds", (s_token,), None, Options::default(), None)
            .await?;
        Ok(speed)
    }

    async fn borrower_index(&self, s_token: Address, borrower: Address) -> Result<U256> {
        let index: U256 = self
            .contract
            .query(
                "strikeBorrowerIndex",
                (s_token, borrower),
                None,
                Options::default(),
                None,
            )
            .await?;
        Ok(index)
    }

    async fn claim_rewards(
        &self,
        holders: Vec<Address>,
        s_tokens: Vec<Address>,
        borrowers: bool,
        suppliers: bool,
    ) -> Result<H256> {
        let options = Options {
            gas: self.gas_limit,
            ..Default::default()
        };
        let params = (holders, s_tokens, borrowers, suppliers);

        let receipt = match &self.signer {
            Some(Signer::Local(key)) => {
                self.contract
                    .signed_call_with_confirmations(
                        "claimStrike",
                        params,
                        options,
                        self.confirmations,
                        SecretKeyRef::new(key),
                    )
                    .await?
            }
            Some(Signer::Node(from)) => {
                self.contract
                    .call_with_confirmations(
                        "claimStrike",
                        params,
                        *from,
                        options,
                        self.confirmations,
                    )
                    .await?
            }
            None => {
                return Err(FlywheelError::InvalidArgument(
                    "no signer configured for claim transactions".to_string(),
                ))
            }
        };

        if receipt.status == Some(U64::zero()) {
            return Err(FlywheelError::TransactionFailed(format!(
                "{:?} reverted",
                receipt.transaction_hash
            )));
        }
        Ok(receipt.transaction_hash)
    }
}
