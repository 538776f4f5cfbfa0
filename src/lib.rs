// src/lib.rs

use std::sync::Arc;

use blockchain::{
    services::{
        subscan::SubscanClient,
        transfer::{ChainConnector, TransferBuilder, WsChainConnector},
    },
    NetworkResolver,
};

pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod utils;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Maps chain ids and names onto registry entries
    pub resolver: NetworkResolver,
    /// Subscan indexer client
    pub subscan: SubscanClient,
    /// Builds unsigned transfers against chain nodes
    pub transfers: TransferBuilder,
}

impl AppState {
    /// State backed by the live Subscan API and WebSocket chain nodes.
    pub fn new(config: config::Config) -> Self {
        Self::with_services(
            config,
            SubscanClient::http(),
            Arc::new(WsChainConnector),
        )
    }

    pub fn with_services(
        config: config::Config,
        subscan: SubscanClient,
        connector: Arc<dyn ChainConnector>,
    ) -> Self {
        Self {
            config,
            resolver: NetworkResolver::default(),
            subscan,
            transfers: TransferBuilder::new(connector),
        }
    }
}
