use std::future::Future;

use log::info;
use url::Url;

use crate::network::Network;
use crate::types::{AccountRecord, AccountsResponse, PaginationSummary, Result};

const PROD_URL: &str = "https://api.strike.finance/api/v2/account";
const STAGE_URL: &str = "https://api.stage.strike.finance/api/v2/account";

pub const PAGE_SIZE: u32 = 2000;
const MIN_BORROW_VALUE_IN_ETH: &str = "0.00000000000000001";

/// Client for the account-listing endpoint.
pub struct AccountApi {
    client: reqwest::Client,
    base_url: String,
}

impl AccountApi {
    pub fn new(stage: bool) -> Self {
        Self::with_base_url(if stage { STAGE_URL } else { PROD_URL })
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn page_url(&self, network: Network, page_number: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("min_borrow_value_in_eth[value]", MIN_BORROW_VALUE_IN_ETH)
            .append_pair("network", network.name())
            .append_pair("page_size", &PAGE_SIZE.to_string())
            .append_pair("page_number", &page_number.to_string());
        Ok(url)
    }

    /// Fetches every page of borrowing accounts for `network`, in page order.
    pub async fn fetch_accounts(&self, network: Network) -> Result<Vec<AccountRecord>> {
        collect_pages(|page_number| self.fetch_page(network, page_number)).await
    }

    async fn fetch_page(&self, network: Network, page_number: u32) -> Result<AccountsResponse> {
        let url = self.page_url(network, page_number)?;
        info!("[AccountApi::fetch_page] Requesting {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

/// The page after `page_number`, or `None` once the summary says we are done.
/// A response without a summary is a single page.
pub fn next_page(page_number: u32, summary: Option<&PaginationSummary>) -> Option<u32> {
    let total_pages = summary.and_then(|s| s.total_pages).unwrap_or(1);
    (page_number < total_pages).then(|| page_number + 1)
}

/// Walks pages from 1 until `next_page` stops, concatenating accounts in page order.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<AccountRecord>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<AccountsResponse>>,
{
    let mut accounts = Vec::new();
    let mut page_number = 1;

    loop {
        let response = fetch_page(page_number).await?;
        info!(
            "[api::collect_pages] page {} returned {} accounts",
            page_number,
            response.accounts.len()
        );
        accounts.extend(response.accounts);

        match next_page(page_number, response.pagination_summary.as_ref()) {
            Some(next) => page_number = next,
            None => break,
        }
    }

    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::types::FlywheelError;
    use web3::types::Address;

    #[test]
    fn test_page_url_carries_filters() {
        let api = AccountApi::new(false);
        let url = api.page_url(Network::Mainnet, 3).unwrap();
        assert_eq!(url.host_str(), Some("api.strike.finance"));
        assert_eq!(url.path(), "/api/v2/account");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "min_borrow_value_in_eth[value]".to_string(),
                    "0.00000000000000001".to_string()
                ),
                ("network".to_string(), "mainnet".to_string()),
                ("page_size".to_string(), "2000".to_string()),
                ("page_number".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_stage_host() {
        let api = AccountApi::new(true);
        let url = api.page_url(Network::Rinkeby, 1).unwrap();
        assert_eq!(url.host_str(), Some("api.stage.strike.finance"));
    }

    #[test]
    fn test_response_without_pagination_summary() {
        let body = r#"{
            "accounts": [{
                "address": "0x00000000000000000000000000000000000000aa",
                "health": {"value": "1.5"},
                "tokens": [{
                    "address": "0x00000000000000000000000000000000000000bb",
                    "borrow_balance_underlying": {"value": "12.5"},
                    "supply_balance_underlying": {"value": "0"}
                }]
            }],
            "error": null
        }"#;
        let response: AccountsResponse = serde_json::from_str(body).unwrap();
        assert!(response.pagination_summary.is_none());
        assert_eq!(response.accounts.len(), 1);
        assert!(response.accounts[0].tokens[0]
            .borrow_balance_underlying
            .value
            .is_positive());
    }

    fn page(first: u64, count: u64, total_pages: Option<u32>) -> AccountsResponse {
        let accounts: Vec<serde_json::Value> = (first..first + count)
            .map(|n| serde_json::json!({ "address": format!("{:?}", Address::from_low_u64_be(n)) }))
            .collect();
        let mut body = serde_json::json!({ "accounts": accounts });
        if let Some(total_pages) = total_pages {
            body["pagination_summary"] = serde_json::json!({
                "page_number": 1,
                "page_size": PAGE_SIZE,
                "total_pages": total_pages,
            });
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_next_page() {
        let three = PaginationSummary { total_pages: Some(3) };
        assert_eq!(next_page(1, Some(&three)), Some(2));
        assert_eq!(next_page(2, Some(&three)), Some(3));
        assert_eq!(next_page(3, Some(&three)), None);
        assert_eq!(next_page(1, None), None);
        assert_eq!(next_page(1, Some(&PaginationSummary { total_pages: None })), None);
        assert_eq!(next_page(1, Some(&PaginationSummary { total_pages: Some(0) })), None);
    }

    #[tokio::test]
    async fn test_pages_joined_in_order() {
        let requested = RefCell::new(Vec::new());
        let accounts = collect_pages(|page_number| {
            requested.borrow_mut().push(page_number);
            let response = page(u64::from(page_number) * 10, 2, Some(3));
            async move { Ok(response) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.borrow(), vec![1, 2, 3]);
        let addresses: Vec<Address> = accounts.iter().map(|a| a.address).collect();
        let expected: Vec<Address> = [10, 11, 20, 21, 30, 31]
            .into_iter()
            .map(Address::from_low_u64_be)
            .collect();
        assert_eq!(addresses, expected);
    }

    #[tokio::test]
    async fn test_missing_summary_is_one_page() {
        let requested = RefCell::new(Vec::new());
        let accounts = collect_pages(|page_number| {
            requested.borrow_mut().push(page_number);
            let response = page(1, 4, None);
            async move { Ok(response) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.borrow(), vec![1]);
        assert_eq!(accounts.len(), 4);
    }

    #[tokio::test]
    async fn test_zero_total_pages_stops_after_first() {
        let requested = RefCell::new(Vec::new());
        let accounts = collect_pages(|page_number| {
            requested.borrow_mut().push(page_number);
            let response = page(1, 0, Some(0));
            async move { Ok(response) }
        })
        .await
        .unwrap();

        assert_eq!(*requested.borrow(), vec![1]);
        assert!(accounts.is_empty());
    }

    #[tokio::test]
    async fn test_page_failure_aborts() {
        let result = collect_pages(|page_number| async move {
            if page_number == 2 {
                Err(FlywheelError::InvalidArgument("page 2 unavailable".to_string()))
            } else {
                Ok(page(1, 1, Some(3)))
            }
        })
        .await;
        assert!(matches!(result, Err(FlywheelError::InvalidArgument(_))));
    }
}
