//! The four Polkadot tools.
//!
//! Every operation returns a [`ToolResponse`]; failures never escape as
//! errors, they become `{status: "error", data: {message}}` payloads.

use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    blockchain::{
        models::{TokenResult, ToolError, ToolResponse, TransferSpec},
        stats::NetworkStats,
        ResolvedNetwork,
    },
    AppState,
};

pub const LIST_NETWORKS: &str = "get_list_of_polkadot_networks";
pub const NETWORK_INFO: &str = "get_network_info_polkadot";
pub const USER_BALANCE: &str = "get_user_balance_polkadot";
pub const BUILD_TRANSFER: &str = "build_transfer_transaction_polkadot";

pub const TOOL_NAMES: [&str; 4] = [LIST_NETWORKS, NETWORK_INFO, USER_BALANCE, BUILD_TRANSFER];

const SUBSCAN_NOT_FOUND_MESSAGE: &str = "404 from Subscan. Check base URL & endpoint support.";

/// JSON schema definitions advertised through `tools/list`.
pub fn tool_definitions() -> Value {
    let chain_id = json!({
        "type": "integer",
        "description": "The ID of the Polkadot chain to query. For example, 0 for Polkadot, 1 for Kusama, etc."
    });
    let chain_name = json!({
        "type": "string",
        "description": "The name of the Polkadot chain to query, e.g. 'Polkadot'. Must refer to the same network as chainId."
    });

    json!([
        {
            "name": LIST_NETWORKS,
            "description": "Retrieves a list of available Polkadot networks.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        },
        {
            "name": NETWORK_INFO,
            "description": "Retrieves information about the Polkadot network.",
            "inputSchema": {
                "type": "object",
                "properties": { "chainId": chain_id, "chainName": chain_name },
                "required": ["chainId", "chainName"]
            }
        },
        {
            "name": USER_BALANCE,
            "description": "Gets the user's balance on the Polkadot network.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "userAddress": {"type": "string", "description": "The Polkadot address to fetch the balance for."},
                    "chainId": chain_id,
                    "chainName": chain_name
                },
                "required": ["userAddress", "chainId", "chainName"]
            }
        },
        {
            "name": BUILD_TRANSFER,
            "description": "Builds an unsigned balance transfer for a Polkadot network.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "toAddress": {"type": "string", "description": "The recipient's Polkadot address."},
                    "amount": {"type": "string", "description": "The amount to transfer in whole tokens, e.g. '1.5'. Converted to planck automatically."},
                    "chainId": chain_id,
                    "chainName": chain_name
                },
                "required": ["toAddress", "amount", "chainId", "chainName"]
            }
        }
    ])
}

fn respond<T: serde::Serialize>(tool: &str, result: Result<T, ToolError>) -> ToolResponse {
    match result {
        Ok(data) => ToolResponse::success(&data),
        Err(e) => {
            error!("Error in {}: {}", tool, e);
            ToolResponse::from(e)
        }
    }
}

fn api_key(state: &AppState) -> Result<&str, ToolError> {
    state
        .config
        .subscan_api_key()
        .ok_or(ToolError::MissingCredential)
}

/// Full registry dump, in chain id order.
pub fn list_networks(state: &AppState) -> ToolResponse {
    let networks: Vec<ResolvedNetwork> = state.resolver.all();
    ToolResponse::success(&networks)
}

pub async fn network_info(state: &AppState, chain_id: i64, chain_name: &str) -> ToolResponse {
    respond(NETWORK_INFO, try_network_info(state, chain_id, chain_name).await)
}

async fn try_network_info(
    state: &AppState,
    chain_id: i64,
    chain_name: &str,
) -> Result<NetworkStats, ToolError> {
    let network = state.resolver.validate_consistent_pair(chain_id, chain_name)?;
    let api_key = api_key(state)?;

    info!("Fetching network stats for {}", network.network_name);
    let stats = state
        .subscan
        .get_network_stats(&network.base_url, api_key, state.config.stats_sample_size)
        .await?;
    Ok(stats)
}

pub async fn user_balance(
    state: &AppState,
    user_address: &str,
    chain_id: i64,
    chain_name: &str,
) -> ToolResponse {
    let result = try_user_balance(state, user_address, chain_id, chain_name).await;
    match result {
        Err(ToolError::Subscan(e)) if e.is_not_found() => {
            error!("Error in {}: {}", USER_BALANCE, e);
            ToolResponse::error(SUBSCAN_NOT_FOUND_MESSAGE)
        }
        other => respond(USER_BALANCE, other),
    }
}

async fn try_user_balance(
    state: &AppState,
    user_address: &str,
    chain_id: i64,
    chain_name: &str,
) -> Result<Vec<TokenResult>, ToolError> {
    let network = state.resolver.validate_consistent_pair(chain_id, chain_name)?;
    let api_key = api_key(state)?;

    info!("Fetching balances of {} on {}", user_address, network.network_name);
    let tokens = state
        .subscan
        .get_account_tokens(&network.base_url, api_key, user_address)
        .await?;
    Ok(tokens)
}

pub async fn build_transfer(
    state: &AppState,
    to_address: &str,
    amount: &str,
    chain_id: i64,
    chain_name: &str,
) -> ToolResponse {
    respond(
        BUILD_TRANSFER,
        try_build_transfer(state, to_address, amount, chain_id, chain_name).await,
    )
}

async fn try_build_transfer(
    state: &AppState,
    to_address: &str,
    amount: &str,
    chain_id: i64,
    chain_name: &str,
) -> Result<TransferSpec, ToolError> {
    let network = state.resolver.validate_consistent_pair(chain_id, chain_name)?;

    if to_address.trim().is_empty() || amount.trim().is_empty() || chain_name.trim().is_empty() {
        return Err(ToolError::MissingParameters(
            "toAddress, amount, or chainName".to_string(),
        ));
    }

    // Tool callers always get the keep-alive variant.
    let spec = state
        .transfers
        .build(to_address, amount, &network, true)
        .await?;
    Ok(spec)
}
