use axum::{extract::State, response::IntoResponse, Json};

use crate::{mcp::tools, AppState};

/// Registry dump in the same `{status, data}` shape the MCP tool returns.
pub async fn list_networks_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(tools::list_networks(&state))
}
