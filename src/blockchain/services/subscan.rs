//! Subscan REST client.
//!
//! Deployments differ in which endpoints they expose, so each fetch walks an
//! ordered list of endpoints and stops at the first one that does not answer
//! 404. Any other failure is returned as-is.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::blockchain::models::{AccountTokens, TokenBalance, TokenResult};
use crate::blockchain::stats::{self, BlockNumber, BlockSample, NetworkStats};
use crate::blockchain::units;

const TOKENS_TIMEOUT: Duration = Duration::from_secs(15);
const BLOCKS_TIMEOUT: Duration = Duration::from_secs(15);
const LATEST_BLOCK_TIMEOUT: Duration = Duration::from_secs(12);

const NATIVE_CATEGORY: &str = "Native";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscanError {
    /// HTTP 404; the endpoint does not exist on this deployment.
    #[error("Subscan endpoint not found: {url}")]
    NotFound { url: String },
    #[error("{message}")]
    Http { status: u16, message: String },
    /// 200 response carrying a non-zero application code.
    #[error("{0}")]
    Api(String),
    #[error("Subscan request failed: {0}")]
    Transport(String),
    #[error("Unexpected Subscan response: {0}")]
    Decode(String),
}

impl SubscanError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SubscanError::NotFound { .. } => Some(StatusCode::NOT_FOUND.as_u16()),
            SubscanError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SubscanError::NotFound { .. })
    }
}

/// Raw JSON POST against a Subscan deployment.
#[async_trait]
pub trait SubscanTransport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, SubscanError>;
}

/// `reqwest`-backed transport.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SubscanTransport for HttpTransport {
    async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, SubscanError> {
        debug!("POST {}", url);
        let resp = self
            .client
            .post(url)
            .header("X-API-Key", api_key)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| SubscanError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SubscanError::NotFound {
                url: url.to_string(),
            });
        }

        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!("Request failed with status code {}", status.as_u16())
                });
            return Err(SubscanError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

// --- Wire formats ---

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct TokensData {
    #[serde(default)]
    list: Option<Vec<TokenBalance>>,
    #[serde(default)]
    native: Vec<TokenBalance>,
    #[serde(default)]
    assets: Vec<TokenBalance>,
}

#[derive(Debug, Deserialize)]
struct BlockItem {
    block_num: BlockNumber,
    block_timestamp: i64,
    #[serde(default)]
    block_hash: Option<String>,
    #[serde(default)]
    hash: Option<String>,
}

impl From<BlockItem> for BlockSample {
    fn from(item: BlockItem) -> Self {
        BlockSample {
            block_number: item.block_num,
            timestamp_secs: item.block_timestamp,
            block_hash: item.block_hash.or(item.hash),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BlocksData {
    #[serde(default)]
    blocks: Option<Vec<BlockItem>>,
    #[serde(default)]
    list: Option<Vec<BlockItem>>,
}

// --- Endpoint candidates ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokensEndpoint {
    V2,
    Legacy,
}

impl TokensEndpoint {
    pub const FALLBACK_ORDER: [TokensEndpoint; 2] = [TokensEndpoint::V2, TokensEndpoint::Legacy];

    fn path(self) -> &'static str {
        match self {
            TokensEndpoint::V2 => "/api/v2/scan/account/tokens",
            TokensEndpoint::Legacy => "/api/scan/account/tokens",
        }
    }

    fn label(self) -> &'static str {
        match self {
            TokensEndpoint::V2 => "v2",
            TokensEndpoint::Legacy => "v1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlocksEndpoint {
    Recent,
    Latest,
}

impl BlocksEndpoint {
    pub const FALLBACK_ORDER: [BlocksEndpoint; 2] = [BlocksEndpoint::Recent, BlocksEndpoint::Latest];

    fn path(self) -> &'static str {
        match self {
            BlocksEndpoint::Recent => "/api/v2/scan/blocks",
            BlocksEndpoint::Latest => "/api/v2/scan/block/latest",
        }
    }
}

/// Tries each candidate in order until one answers with something other than
/// a 404. If every candidate 404s, the last 404 is returned.
async fn first_available<C, T, F, Fut>(candidates: &[C], mut attempt: F) -> Result<T, SubscanError>
where
    C: Copy + fmt::Debug,
    F: FnMut(C) -> Fut,
    Fut: Future<Output = Result<T, SubscanError>>,
{
    let mut outcome = Err(SubscanError::Decode("no endpoint candidates".to_string()));
    for &candidate in candidates {
        outcome = attempt(candidate).await;
        match &outcome {
            Err(SubscanError::NotFound { url }) => {
                warn!("{:?} endpoint not available at {}, trying next", candidate, url);
            }
            _ => break,
        }
    }
    outcome
}

fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn decode_envelope<T: DeserializeOwned + Default>(
    value: Value,
    error_prefix: &str,
) -> Result<T, SubscanError> {
    let envelope: Envelope<T> =
        serde_json::from_value(value).map_err(|e| SubscanError::Decode(e.to_string()))?;
    if envelope.code != 0 {
        return Err(SubscanError::Api(format!("{}{}", error_prefix, envelope.message)));
    }
    Ok(envelope.data.unwrap_or_default())
}

/// USD value of `amount` whole tokens at `price`, to two places.
pub fn usd_value(amount: &str, price: Option<&str>) -> Option<String> {
    let price = Decimal::from_str(price?.trim()).ok()?;
    let amount = Decimal::from_str(amount).ok()?;
    let value = amount
        .checked_mul(price)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Some(format!("{:.2}", value))
}

/// Client for the Subscan endpoints the tools need.
#[derive(Clone)]
pub struct SubscanClient {
    transport: Arc<dyn SubscanTransport>,
}

impl SubscanClient {
    pub fn new(transport: Arc<dyn SubscanTransport>) -> Self {
        Self { transport }
    }

    pub fn http() -> Self {
        Self::new(Arc::new(HttpTransport::default()))
    }

    /// Token holdings of `address`, native tokens split from other assets.
    pub async fn fetch_account_tokens(
        &self,
        base_url: &str,
        api_key: &str,
        address: &str,
    ) -> Result<AccountTokens, SubscanError> {
        first_available(&TokensEndpoint::FALLBACK_ORDER, |endpoint| {
            self.fetch_tokens_from(endpoint, base_url, api_key, address)
        })
        .await
    }

    async fn fetch_tokens_from(
        &self,
        endpoint: TokensEndpoint,
        base_url: &str,
        api_key: &str,
        address: &str,
    ) -> Result<AccountTokens, SubscanError> {
        let url = endpoint_url(base_url, endpoint.path());
        let body = self
            .transport
            .post_json(&url, api_key, &json!({ "address": address }), TOKENS_TIMEOUT)
            .await?;
        let data: TokensData =
            decode_envelope(body, &format!("Subscan {} error: ", endpoint.label()))?;

        Ok(match data.list {
            Some(list) => {
                let (native, assets) = list
                    .into_iter()
                    .partition(|t| t.category.as_deref() == Some(NATIVE_CATEGORY));
                AccountTokens { native, assets }
            }
            None => AccountTokens {
                native: data.native,
                assets: data.assets,
            },
        })
    }

    /// Up to `sample_size` most recent blocks, highest block number first.
    ///
    /// Deployments without the block list endpoint yield a single-element
    /// sample built from the latest block.
    pub async fn fetch_recent_blocks(
        &self,
        base_url: &str,
        api_key: &str,
        sample_size: u32,
    ) -> Result<Vec<BlockSample>, SubscanError> {
        let mut blocks = first_available(&BlocksEndpoint::FALLBACK_ORDER, |endpoint| {
            self.fetch_blocks_from(endpoint, base_url, api_key, sample_size)
        })
        .await?;
        blocks.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        Ok(blocks)
    }

    async fn fetch_blocks_from(
        &self,
        endpoint: BlocksEndpoint,
        base_url: &str,
        api_key: &str,
        sample_size: u32,
    ) -> Result<Vec<BlockSample>, SubscanError> {
        match endpoint {
            BlocksEndpoint::Recent => {
                let url = endpoint_url(base_url, endpoint.path());
                let body = self
                    .transport
                    .post_json(
                        &url,
                        api_key,
                        &json!({ "page": 0, "row": sample_size }),
                        BLOCKS_TIMEOUT,
                    )
                    .await?;
                let data: BlocksData = decode_envelope(body, "")?;
                let items = data.blocks.or(data.list).unwrap_or_default();
                Ok(items.into_iter().map(BlockSample::from).collect())
            }
            BlocksEndpoint::Latest => Ok(vec![self.fetch_latest_block(base_url, api_key).await?]),
        }
    }

    pub async fn fetch_latest_block(
        &self,
        base_url: &str,
        api_key: &str,
    ) -> Result<BlockSample, SubscanError> {
        let url = endpoint_url(base_url, BlocksEndpoint::Latest.path());
        let body = self
            .transport
            .post_json(&url, api_key, &json!({}), LATEST_BLOCK_TIMEOUT)
            .await?;
        let envelope: Envelope<BlockItem> =
            serde_json::from_value(body).map_err(|e| SubscanError::Decode(e.to_string()))?;
        if envelope.code != 0 {
            return Err(SubscanError::Api(envelope.message));
        }
        envelope
            .data
            .map(BlockSample::from)
            .ok_or_else(|| SubscanError::Decode("latest block response has no data".to_string()))
    }

    /// Holdings of `address` in human units, native token first.
    pub async fn get_account_tokens(
        &self,
        base_url: &str,
        api_key: &str,
        address: &str,
    ) -> Result<Vec<TokenResult>, SubscanError> {
        let tokens = self.fetch_account_tokens(base_url, api_key, address).await?;
        let results = tokens
            .into_ordered()
            .map(|token| {
                let amount = units::to_human(&token.balance, token.decimals)
                    .map_err(|e| SubscanError::Decode(format!("{}: {}", token.symbol, e)))?;
                Ok(TokenResult {
                    token_amount_in_usd: usd_value(&amount, token.price.as_deref()),
                    token_name: token.symbol,
                    token_amount: amount,
                })
            })
            .collect::<Result<Vec<TokenResult>, SubscanError>>()?;
        info!("Fetched {} token balances for {}", results.len(), address);
        Ok(results)
    }

    pub async fn get_network_stats(
        &self,
        base_url: &str,
        api_key: &str,
        sample_size: u32,
    ) -> Result<NetworkStats, SubscanError> {
        let blocks = self
            .fetch_recent_blocks(base_url, api_key, stats::clamp_sample_size(sample_size))
            .await?;
        Ok(stats::aggregate(&blocks))
    }
}
