//! Tests for the HTTP surface

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use polkadot_mcp_server::{api, config::Config, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn create_test_app(config: Config) -> Router {
    api::router(AppState::new(config))
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_reports_credential_status() {
    let app = create_test_app(Config::default().with_subscan_api_key("k"));

    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["subscanConfigured"], true);
}

#[tokio::test]
async fn test_networks_endpoint_matches_tool_payload() {
    let app = create_test_app(Config::default());

    let response = app
        .oneshot(Request::builder().uri("/api/networks").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"][0]["networkName"], "Polkadot");
    assert_eq!(body["data"][1]["chainId"], 1);
}

#[tokio::test]
async fn test_rpc_endpoint_dispatches_tool_calls() {
    let app = create_test_app(Config::default());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/rpc")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "jsonrpc": "2.0",
                        "id": 9,
                        "method": "tools/call",
                        "params": {
                            "name": "get_network_info_polkadot",
                            "arguments": { "chainId": 0, "chainName": "Polkadot" }
                        }
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["id"], 9);
    assert_eq!(body["result"]["isError"], true);
    assert_eq!(
        body["result"]["structuredContent"]["data"]["message"],
        "Missing SUBSCAN_API_KEY environment variable"
    );
}

#[tokio::test]
async fn test_rpc_endpoint_rejects_notifications() {
    let app = create_test_app(Config::default());

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/rpc")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    serde_json::to_vec(&json!({
                        "jsonrpc": "2.0",
                        "method": "notifications/initialized"
                    }))
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let body = read_json(response).await;
    assert_eq!(body["error"]["code"], -32600);
}
