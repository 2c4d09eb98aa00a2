pub mod wallets;

use crate::health;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Storage is reachable", body = HealthResponse),
        (status = 503, description = "Storage is unreachable", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = health::check_health(state.store.clone(), state.start_time).await;

    // Return 503 if the store is down, 200 otherwise
    let status_code = if response.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Wallet API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
        "endpoints": {
            "get_balance": "GET /api/v1/wallets/{wallet_id}",
            "perform_operation": "POST /api/v1/wallets/{wallet_id}/operation",
            "list_transactions": "GET /api/v1/wallets/{wallet_id}/transactions",
            "health_check": "GET /health"
        }
    }))
}
