//! # MCP Handler Module
//!
//! Implements the Model Context Protocol for the Polkadot server: incoming
//! JSON-RPC requests are dispatched to the tools in [`super::tools`].
//!
//! ## Supported Tools
//!
//! - `get_list_of_polkadot_networks` - Every known network with its endpoints
//! - `get_network_info_polkadot` - Latest block and average block time
//! - `get_user_balance_polkadot` - Native and asset balances of an account
//! - `build_transfer_transaction_polkadot` - Unsigned `balances` transfer

use crate::{
    blockchain::models::ToolResponse,
    mcp::{
        protocol::{error_codes, Request, Response, ToolCallParams, PROTOCOL_VERSION},
        tools,
    },
    utils, AppState,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

// Wraps a tool payload as MCP text content, keeping the JSON as structured
// content for clients that read it directly.
fn make_texty_result(payload: ToolResponse) -> Value {
    let text = payload.to_pretty_json();
    let is_error = !payload.is_success();
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": payload,
        "isError": is_error
    })
}

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        debug!("Ignoring notification {}", req.method);
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        // Direct tool invocations are rewritten into tools/call
        method if tools::TOOL_NAMES.contains(&method) => {
            handle_tool_call(req.into_tool_call(), state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.clone().map(serde_json::from_value::<ToolCallParams>) {
        Some(Ok(params)) => params,
        Some(Err(_)) => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let args = &params.arguments;
    let req_id = &req.id;

    let res: Result<Response, Response> = (async {
        let payload = match params.name.as_str() {
            tools::LIST_NETWORKS => tools::list_networks(&state),
            tools::NETWORK_INFO => {
                let chain_id = utils::get_required_arg::<i64>(args, "chainId", req_id)?;
                let chain_name = utils::get_required_arg::<String>(args, "chainName", req_id)?;
                tools::network_info(&state, chain_id, &chain_name).await
            }
            tools::USER_BALANCE => {
                let user_address = utils::get_required_arg::<String>(args, "userAddress", req_id)?;
                let chain_id = utils::get_required_arg::<i64>(args, "chainId", req_id)?;
                let chain_name = utils::get_required_arg::<String>(args, "chainName", req_id)?;
                tools::user_balance(&state, &user_address, chain_id, &chain_name).await
            }
            tools::BUILD_TRANSFER => {
                let to_address = utils::get_required_arg::<String>(args, "toAddress", req_id)?;
                let amount = utils::get_required_arg::<String>(args, "amount", req_id)?;
                let chain_id = utils::get_required_arg::<i64>(args, "chainId", req_id)?;
                let chain_name = utils::get_required_arg::<String>(args, "chainName", req_id)?;
                tools::build_transfer(&state, &to_address, &amount, chain_id, &chain_name).await
            }
            unknown => {
                warn!("Unknown tool requested: {}", unknown);
                return Err(Response::error(
                    req_id.clone(),
                    error_codes::METHOD_NOT_FOUND,
                    format!("Unknown tool: {}", unknown),
                ));
            }
        };
        Ok(Response::success(req_id.clone(), make_texty_result(payload)))
    })
    .await;

    res.unwrap_or_else(|err_resp| err_resp)
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "polkadot_mcp",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "Polkadot MCP server for network discovery, chain statistics, account balances and unsigned transfer construction.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    Response::success(req.id.clone(), json!({ "tools": tools::tool_definitions() }))
}
