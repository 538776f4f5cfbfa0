//! # API Module
//!
//! HTTP handlers for the Polkadot MCP server, mounted under `/api`.
//!
//! ## Available Endpoints
//!
//! - `GET /health` - Liveness and credential status
//! - `GET /networks` - Every known network with its endpoints
//! - `POST /rpc` - MCP JSON-RPC over HTTP

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod health;
pub mod networks;
pub mod rpc;

/// Full HTTP application with every route nested under `/api`.
pub fn router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/networks", get(networks::list_networks_handler))
        // JSON-RPC endpoint for MCP tool calls
        .route("/rpc", post(rpc::rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
