use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "networks": state.resolver.all().len(),
        "subscanConfigured": state.config.subscan_api_key().is_some()
    }))
}
