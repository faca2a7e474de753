//! Live-cell listing from the chain explorer's JSON:API endpoint.

use crate::client::{FetchOutcome, RateLimitedRetryingClient};
use crate::error::ExplorerError;
use crate::transport::{HttpRequest, HttpTransport};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use watchdog_types::{CkbAddress, NetworkId, Shannons};

/// Default number of cells per explorer page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

const JSON_API: &str = "application/vnd.api+json";

#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    /// e.g. `https://mainnet-api.explorer.nervos.org/api/v1`
    pub api_base: String,
    pub page_size: u32,
}

impl ExplorerConfig {
    pub fn for_network(network: NetworkId) -> Self {
        Self {
            api_base: network.default_explorer_api().to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self::for_network(NetworkId::Mainnet)
    }
}

/// One live cell, reduced to what weight computation needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveCell {
    pub cell_type: String,
    /// `None` when the explorer sent something other than whole shannons.
    pub capacity: Option<Shannons>,
}

/// Result of fetching a single page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageFetch {
    Page(Vec<LiveCell>),
    /// The explorer answered 404 for this address/page.
    NotFound,
}

#[derive(Debug, Deserialize)]
struct LiveCellsBody {
    #[serde(default)]
    data: Vec<CellEntry>,
}

#[derive(Debug, Deserialize)]
struct CellEntry {
    #[serde(default)]
    attributes: CellAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct CellAttributes {
    #[serde(default)]
    cell_type: Option<String>,
    #[serde(default)]
    capacity: Value,
}

fn parse_capacity(value: &Value) -> Result<Shannons, ExplorerError> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(ExplorerError::Malformed(format!("capacity {other}"))),
    };
    Shannons::parse_decimal(&text).map_err(|e| ExplorerError::Malformed(e.to_string()))
}

pub struct ExplorerApi<T> {
    client: Arc<RateLimitedRetryingClient<T>>,
    config: ExplorerConfig,
}

impl<T: HttpTransport> ExplorerApi<T> {
    pub fn new(client: Arc<RateLimitedRetryingClient<T>>, config: ExplorerConfig) -> Self {
        Self { client, config }
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    fn page_url(&self, address: &CkbAddress, page: u32) -> String {
        format!(
            "{}/address_live_cells/{}?page={page}&page_size={}&sort=capacity.desc",
            self.config.api_base.trim_end_matches('/'),
            address.as_str(),
            self.config.page_size
        )
    }

    /// Fetch page `page` (1-based) of an address's live cells.
    pub async fn live_cells_page(&self, address: &CkbAddress, page: u32) -> Result<PageFetch, ExplorerError> {
        let request = HttpRequest::get(self.page_url(address, page))
            .header("accept", JSON_API)
            .header("content-type", JSON_API);
        let response = match self.client.execute(&request).await? {
            FetchOutcome::Success(response) => response,
            FetchOutcome::NotFound => return Ok(PageFetch::NotFound),
        };
        let body: LiveCellsBody = response
            .json()
            .map_err(|e| ExplorerError::Malformed(format!("{}: {e}", request.url)))?;

        let cells = body
            .data
            .into_iter()
            .map(|entry| {
                let cell_type = entry.attributes.cell_type.unwrap_or_default();
                let capacity = match parse_capacity(&entry.attributes.capacity) {
                    Ok(capacity) => Some(capacity),
                    Err(e) => {
                        debug!(cell_type = %cell_type, error = %e, "unreadable cell capacity");
                        None
                    }
                };
                LiveCell { cell_type, capacity }
            })
            .collect();
        Ok(PageFetch::Page(cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::retry::RetryPolicy;
    use crate::transport::ReqwestTransport;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDR: &str = "ckb1qyqt8xaupvm8837nv3gtc9x0ekkj64vud3jqfwyw5v";

    fn explorer(server: &MockServer) -> ExplorerApi<ReqwestTransport> {
        let client = Arc::new(RateLimitedRetryingClient::new(
            ReqwestTransport::new().unwrap(),
            Duration::ZERO,
            RetryPolicy {
                max_retries: 1,
                backoff: Duration::ZERO,
            },
        ));
        ExplorerApi::new(
            client,
            ExplorerConfig {
                api_base: server.uri(),
                page_size: 20,
            },
        )
    }

    #[tokio::test]
    async fn parses_string_and_numeric_capacities() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/address_live_cells/{ADDR}")))
            .and(query_param("page", "2"))
            .and(query_param("page_size", "20"))
            .and(query_param("sort", "capacity.desc"))
            .and(header("accept", JSON_API))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": [
                {"attributes": {"cell_type": "nervos_dao_deposit", "capacity": "10000000000.0"}},
                {"attributes": {"cell_type": "normal", "capacity": 6100000000u64}}
            ]})))
            .mount(&server)
            .await;

        let fetched = explorer(&server)
            .live_cells_page(&CkbAddress::new(ADDR), 2)
            .await
            .unwrap();
        assert_eq!(
            fetched,
            PageFetch::Page(vec![
                LiveCell {
                    cell_type: "nervos_dao_deposit".into(),
                    capacity: Some(Shannons::new(10_000_000_000)),
                },
                LiveCell {
                    cell_type: "normal".into(),
                    capacity: Some(Shannons::new(6_100_000_000)),
                },
            ])
        );
    }

    #[tokio::test]
    async fn not_found_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let fetched = explorer(&server)
            .live_cells_page(&CkbAddress::new(ADDR), 1)
            .await
            .unwrap();
        assert_eq!(fetched, PageFetch::NotFound);
    }

    #[tokio::test]
    async fn unreadable_capacity_keeps_the_cell() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": [
                {"attributes": {"cell_type": "nervos_dao_deposit", "capacity": "1.5"}},
                {"attributes": {"cell_type": "normal", "capacity": null}}
            ]})))
            .mount(&server)
            .await;
        let fetched = explorer(&server)
            .live_cells_page(&CkbAddress::new(ADDR), 1)
            .await
            .unwrap();
        let PageFetch::Page(cells) = fetched else {
            panic!("expected a page");
        };
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.capacity.is_none()));
    }

    #[tokio::test]
    async fn undecodable_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;
        assert!(matches!(
            explorer(&server).live_cells_page(&CkbAddress::new(ADDR), 1).await,
            Err(ExplorerError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;
        assert!(matches!(
            explorer(&server).live_cells_page(&CkbAddress::new(ADDR), 1).await,
            Err(ExplorerError::Client(ClientError::Exhausted { attempts: 2, .. }))
        ));
    }
}
