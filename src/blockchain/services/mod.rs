// src/blockchain/services/mod.rs

pub mod subscan;
pub mod transfer;

pub use subscan::{SubscanClient, SubscanError, SubscanTransport};
pub use transfer::{ChainConnector, RpcSession, TransferBuilder, TransferError, WsChainConnector};
