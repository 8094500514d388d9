use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::AppState;

const ENDPOINTS: &[&str] = &[
    "GET /accounts - Get trading accounts list",
    "GET /accounts/:accountId/balance - Get account balance",
    "GET /accounts/:accountId/positions - Open positions pushed by the cBot",
    "GET /accounts/:accountId/trades - Trade history pushed by the cBot",
    "GET /profile - Get user profile",
    "GET /status - Server status",
    "POST /cbot/positions | /cbot/trades | /cbot/stress - cBot push endpoints",
    "GET /cbot/positions | /cbot/trades | /cbot/stress - Query pushed data",
    "GET /cbot/status - Ingestion statistics",
];

pub async fn home() -> impl IntoResponse {
    Json(json!({
        "message": "cTrader Bridge Server is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ENDPOINTS,
    }))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// GET /status
pub async fn status(State(state): State<AppState>) -> Response {
    let tokens = state.broker.tokens();

    match tokens.get_valid_token().await {
        Ok(token) => Json(json!({
            "status": "online",
            "tokenValid": !token.is_empty(),
            "tokenExpiresAt": tokens.expires_at().await.to_rfc3339(),
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "error": e.to_string(),
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response(),
    }
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "availableEndpoints": [
                "/",
                "/status",
                "/profile",
                "/accounts",
                "/accounts/:accountId/balance",
                "/accounts/:accountId/positions",
                "/accounts/:accountId/trades",
                "/cbot/positions",
                "/cbot/trades",
                "/cbot/stress",
                "/cbot/status",
            ],
        })),
    )
}
