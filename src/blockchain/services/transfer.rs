//! Builds unsigned `balances` transfer descriptions against a live chain node.

use std::sync::Arc;

use async_trait::async_trait;
use ethers_providers::{Provider, Ws};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::blockchain::models::TransferSpec;
use crate::blockchain::resolver::ResolvedNetwork;
use crate::blockchain::units::{self, AmountError};

/// Used when the node's `system_properties` carry no `tokenDecimals`.
pub const DEFAULT_CHAIN_DECIMALS: u32 = 10;

const BALANCES_SECTION: &str = "balances";

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("No RPC found for chain: {0}")]
    NoRpcEndpoint(String),
    #[error("Failed to connect to {endpoint}: {message}")]
    Connection { endpoint: String, message: String },
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// An open connection to a chain node. Must be closed with
/// [`RpcSession::disconnect`] once the caller is done with it.
#[async_trait]
pub trait RpcSession: Send + Sync {
    /// Smallest-unit decimals of the chain's native token, if the node
    /// reports them.
    async fn chain_decimals(&self) -> Result<Option<u32>, TransferError>;

    async fn disconnect(self: Box<Self>);
}

#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn RpcSession>, TransferError>;
}

/// Connects to Substrate nodes over WebSocket JSON-RPC.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsChainConnector;

#[async_trait]
impl ChainConnector for WsChainConnector {
    async fn connect(&self, endpoint: &str) -> Result<Box<dyn RpcSession>, TransferError> {
        debug!("Opening RPC session to {}", endpoint);
        let provider = Provider::<Ws>::connect(endpoint)
            .await
            .map_err(|e| TransferError::Connection {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;
        Ok(Box::new(WsSession {
            endpoint: endpoint.to_string(),
            provider,
        }))
    }
}

struct WsSession {
    endpoint: String,
    provider: Provider<Ws>,
}

#[async_trait]
impl RpcSession for WsSession {
    async fn chain_decimals(&self) -> Result<Option<u32>, TransferError> {
        let properties: Value = self
            .provider
            .request("system_properties", Vec::<Value>::new())
            .await
            .map_err(|e| TransferError::Rpc(e.to_string()))?;
        Ok(token_decimals(&properties))
    }

    async fn disconnect(self: Box<Self>) {
        let WsSession { endpoint, provider } = *self;
        // Dropping the last provider handle shuts the socket down.
        drop(provider);
        debug!("Closed RPC session to {}", endpoint);
    }
}

/// `tokenDecimals` is a bare number on some chains and a per-token array on
/// others; the first entry belongs to the native token.
pub fn token_decimals(properties: &Value) -> Option<u32> {
    let decimals = match properties.get("tokenDecimals")? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    decimals.as_u64().and_then(|d| u32::try_from(d).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Refuses to take the sender below the existential deposit.
    KeepAlive,
    AllowDeath,
}

impl TransferKind {
    pub fn from_keep_alive(keep_alive: bool) -> Self {
        if keep_alive {
            TransferKind::KeepAlive
        } else {
            TransferKind::AllowDeath
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            TransferKind::KeepAlive => "transferKeepAlive",
            TransferKind::AllowDeath => "transferAllowDeath",
        }
    }
}

#[derive(Clone)]
pub struct TransferBuilder {
    connector: Arc<dyn ChainConnector>,
}

impl TransferBuilder {
    pub fn new(connector: Arc<dyn ChainConnector>) -> Self {
        Self { connector }
    }

    /// Describes a transfer of `amount` (human units) to `to_address`.
    ///
    /// Opens a session to the network's node for the chain decimals. Once a
    /// session is open it is closed again whether or not the build succeeds.
    pub async fn build(
        &self,
        to_address: &str,
        amount: &str,
        network: &ResolvedNetwork,
        keep_alive: bool,
    ) -> Result<TransferSpec, TransferError> {
        let rpc = network
            .rpc
            .as_deref()
            .ok_or_else(|| TransferError::NoRpcEndpoint(network.network_name.clone()))?;
        units::check_format(amount)?;

        let session = SessionGuard::new(self.connector.connect(rpc).await?);
        let outcome = match session.session() {
            Ok(open) => {
                describe_transfer(
                    open,
                    rpc,
                    to_address,
                    amount,
                    TransferKind::from_keep_alive(keep_alive),
                )
                .await
            }
            Err(e) => Err(e),
        };
        session.release().await;

        if let Ok(spec) = &outcome {
            info!(
                "Built {}.{} on {} for {}",
                spec.section, spec.method, network.network_name, to_address
            );
        }
        outcome
    }
}

/// Owns an open session and guarantees it is disconnected.
///
/// [`SessionGuard::release`] closes it in place. If the guard is dropped
/// instead (the caller's future was cancelled, or a panic unwound through
/// it) the disconnect is handed to the runtime.
struct SessionGuard {
    session: Option<Box<dyn RpcSession>>,
}

impl SessionGuard {
    fn new(session: Box<dyn RpcSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    fn session(&self) -> Result<&dyn RpcSession, TransferError> {
        self.session
            .as_deref()
            .ok_or_else(|| TransferError::Rpc("RPC session already closed".to_string()))
    }

    async fn release(mut self) {
        if let Some(session) = self.session.take() {
            session.disconnect().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!("Transfer build abandoned, closing RPC session in background");
                handle.spawn(session.disconnect());
            }
            Err(_) => warn!("No runtime to close abandoned RPC session; dropping it"),
        }
    }
}

async fn describe_transfer(
    session: &dyn RpcSession,
    rpc: &str,
    to_address: &str,
    amount: &str,
    kind: TransferKind,
) -> Result<TransferSpec, TransferError> {
    let decimals = session
        .chain_decimals()
        .await?
        .unwrap_or(DEFAULT_CHAIN_DECIMALS);
    let planck = units::to_raw(amount, decimals)?;

    Ok(TransferSpec {
        rpc: rpc.to_string(),
        section: BALANCES_SECTION.to_string(),
        method: kind.method().to_string(),
        args: vec![to_address.to_string(), planck.to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::resolver::NetworkResolver;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Decimals {
        Reported(u32),
        Missing,
        Fails,
        Stalls,
    }

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        disconnects: AtomicUsize,
    }

    struct FakeConnector {
        decimals: Decimals,
        refuse: bool,
        counters: Arc<Counters>,
    }

    struct FakeSession {
        decimals: Decimals,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl ChainConnector for FakeConnector {
        async fn connect(&self, endpoint: &str) -> Result<Box<dyn RpcSession>, TransferError> {
            if self.refuse {
                return Err(TransferError::Connection {
                    endpoint: endpoint.to_string(),
                    message: "refused".into(),
                });
            }
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeSession {
                decimals: self.decimals,
                counters: self.counters.clone(),
            }))
        }
    }

    #[async_trait]
    impl RpcSession for FakeSession {
        async fn chain_decimals(&self) -> Result<Option<u32>, TransferError> {
            match self.decimals {
                Decimals::Reported(d) => Ok(Some(d)),
                Decimals::Missing => Ok(None),
                Decimals::Fails => Err(TransferError::Rpc("metadata unavailable".into())),
                Decimals::Stalls => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }

        async fn disconnect(self: Box<Self>) {
            self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn builder(decimals: Decimals, refuse: bool) -> (TransferBuilder, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let connector = FakeConnector {
            decimals,
            refuse,
            counters: counters.clone(),
        };
        (TransferBuilder::new(Arc::new(connector)), counters)
    }

    fn network(name: &str) -> ResolvedNetwork {
        NetworkResolver::default().resolve_by_name_or_id(name).unwrap()
    }

    fn session_counts(counters: &Counters) -> (usize, usize) {
        (
            counters.connects.load(Ordering::SeqCst),
            counters.disconnects.load(Ordering::SeqCst),
        )
    }

    #[tokio::test]
    async fn builds_keep_alive_transfer_in_planck() {
        let (builder, counters) = builder(Decimals::Reported(10), false);
        let spec = builder
            .build("X", "1.5", &network("Polkadot"), true)
            .await
            .unwrap();

        assert_eq!(
            spec,
            TransferSpec {
                rpc: "wss://rpc.polkadot.io".into(),
                section: "balances".into(),
                method: "transferKeepAlive".into(),
                args: vec!["X".into(), "15000000000".into()],
            }
        );
        assert_eq!(session_counts(&counters), (1, 1));
    }

    #[tokio::test]
    async fn plain_variant_allows_death() {
        let (builder, _) = builder(Decimals::Reported(12), false);
        let spec = builder
            .build("X", "0.25", &network("Paseo"), false)
            .await
            .unwrap();
        assert_eq!(spec.method, "transferAllowDeath");
        assert_eq!(spec.args[1], "250000000000");
    }

    #[tokio::test]
    async fn missing_decimals_default_to_ten() {
        let (builder, _) = builder(Decimals::Missing, false);
        let spec = builder
            .build("X", "2", &network("Astar"), true)
            .await
            .unwrap();
        assert_eq!(spec.args[1], "20000000000");
    }

    #[tokio::test]
    async fn session_is_closed_when_the_build_fails() {
        let (builder, counters) = builder(Decimals::Fails, false);
        let err = builder
            .build("X", "1", &network("Polkadot"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Rpc(_)));
        assert_eq!(session_counts(&counters), (1, 1));
    }

    #[tokio::test]
    async fn session_is_closed_when_the_build_is_cancelled() {
        let (builder, counters) = builder(Decimals::Stalls, false);
        let polkadot = network("Polkadot");

        let timed_out = tokio::time::timeout(
            Duration::from_millis(50),
            builder.build("X", "1", &polkadot, true),
        )
        .await;
        assert!(timed_out.is_err());

        // The disconnect runs as a background task once the build is dropped.
        for _ in 0..50 {
            if counters.disconnects.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(session_counts(&counters), (1, 1));
    }

    #[tokio::test]
    async fn network_without_rpc_is_rejected_before_connecting() {
        let (builder, counters) = builder(Decimals::Reported(10), false);
        let err = builder
            .build("X", "1", &network("Kusama"), true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No RPC found for chain: Kusama");
        assert_eq!(session_counts(&counters), (0, 0));
    }

    #[tokio::test]
    async fn malformed_amount_is_rejected_before_connecting() {
        let (builder, counters) = builder(Decimals::Reported(10), false);
        let err = builder
            .build("X", "1,5", &network("Polkadot"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Amount(_)));
        assert_eq!(session_counts(&counters), (0, 0));
    }

    #[tokio::test]
    async fn failed_connect_has_nothing_to_close() {
        let (builder, counters) = builder(Decimals::Reported(10), true);
        let err = builder
            .build("X", "1", &network("Polkadot"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Connection { .. }));
        assert_eq!(session_counts(&counters), (0, 0));
    }

    #[test]
    fn token_decimals_accepts_number_or_array() {
        assert_eq!(token_decimals(&json!({ "tokenDecimals": 10 })), Some(10));
        assert_eq!(token_decimals(&json!({ "tokenDecimals": [12, 18] })), Some(12));
        assert_eq!(token_decimals(&json!({ "tokenDecimals": [] })), None);
        assert_eq!(token_decimals(&json!({ "ss58Format": 0 })), None);
    }
}
