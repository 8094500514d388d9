use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query as QueryParams, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth,
    errors::AppError,
    models::{PositionRecord, StoredRecord, StressEventRecord, TradeRecord},
    services::{
        query::{Query, DEFAULT_POSITION_LIMIT, DEFAULT_STRESS_LIMIT, DEFAULT_TRADE_LIMIT},
        stats,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub symbol: Option<String>,
    pub label: Option<String>,
    pub limit: Option<String>,
}

/// `limit` must be a positive integer; absent, empty or `0` means `default`.
pub fn parse_limit(raw: Option<&str>, default: usize) -> Result<usize, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<usize>() {
        Ok(0) => Ok(default),
        Ok(n) => Ok(n),
        Err(_) => Err(AppError::Validation(format!("Invalid limit: {raw}"))),
    }
}

/// Unwraps the query string, keeping the `{error}` body for malformed ones.
pub fn list_params<T>(params: Result<QueryParams<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|QueryParams(p)| p)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

// free-form field for log lines; `-` when absent
fn log_field(extra: &serde_json::Map<String, Value>, key: &str) -> String {
    extra.get(key).map_or_else(|| "-".to_string(), Value::to_string)
}

fn build_query(params: ListParams, default_limit: usize) -> Result<Query, AppError> {
    let limit = parse_limit(params.limit.as_deref(), default_limit)?;
    Ok(Query::new(limit).symbol(params.symbol).label(params.label))
}

fn list_response<T: serde::Serialize>(
    data: Vec<T>,
    count: usize,
    total_stored: usize,
    query: &Query,
) -> Response {
    Json(json!({
        "success": true,
        "data": data,
        "count": count,
        "totalStored": total_stored,
        "filters": {
            "symbol": query.symbol,
            "label": query.label,
            "limit": query.limit,
        },
    }))
    .into_response()
}

// POST /cbot/positions
pub async fn post_position(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = auth::authorize_push(&state.settings, &headers, payload)?;

    let now = Utc::now();
    let record = PositionRecord::from_payload(body, now)?;
    let position_id = record.position_id.clone();
    let symbol = record.symbol.clone();
    let account = record.account_id.clone();

    let receipt = state.store.upsert_position(record);

    tracing::info!(
        %symbol,
        %position_id,
        account = account.as_deref().unwrap_or("-"),
        replaced = receipt.replaced,
        total = receipt.total,
        "position received from cBot"
    );

    let message = if receipt.replaced {
        "Position updated"
    } else {
        "Position added"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "positionId": position_id,
        "count": receipt.total,
        "totalPositions": receipt.total,
        "timestamp": now.to_rfc3339(),
    }))
    .into_response())
}

// POST /cbot/trades
pub async fn post_trade(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = auth::authorize_push(&state.settings, &headers, payload)?;

    let now = Utc::now();
    let record = TradeRecord::from_payload(body, now)?;
    let symbol = record.symbol().unwrap_or("-").to_string();
    let net_profit = log_field(&record.extra, "netProfit");

    let receipt = state.store.append_trade(record);

    tracing::info!(
        %symbol,
        %net_profit,
        total = receipt.total,
        "trade received from cBot"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Trade recorded successfully",
        "totalTrades": receipt.total,
        "timestamp": now.to_rfc3339(),
    }))
    .into_response())
}

// POST /cbot/stress
pub async fn post_stress_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = auth::authorize_push(&state.settings, &headers, payload)?;

    let now = Utc::now();
    let record = StressEventRecord::from_payload(body, now)?;
    let symbol = record.symbol().unwrap_or("-").to_string();
    let max_drawdown = log_field(&record.extra, "maxDrawdown");

    let receipt = state.store.append_stress_event(record);

    tracing::info!(
        %symbol,
        %max_drawdown,
        total = receipt.total,
        "stress event received from cBot"
    );

    Ok(Json(json!({
        "success": true,
        "message": "Stress event recorded successfully",
        "totalStressEvents": receipt.total,
        "timestamp": now.to_rfc3339(),
    }))
    .into_response())
}

// GET /cbot/positions
pub async fn get_positions(
    State(state): State<AppState>,
    params: Result<QueryParams<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = build_query(list_params(params)?, DEFAULT_POSITION_LIMIT)?;
    let result = state.store.query_positions(&query);
    Ok(list_response(result.data, result.count, result.total_stored, &query))
}

// GET /cbot/trades
pub async fn get_trades(
    State(state): State<AppState>,
    params: Result<QueryParams<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = build_query(list_params(params)?, DEFAULT_TRADE_LIMIT)?;
    let result = state.store.query_trades(&query);
    Ok(list_response(result.data, result.count, result.total_stored, &query))
}

// GET /cbot/stress
pub async fn get_stress_events(
    State(state): State<AppState>,
    params: Result<QueryParams<ListParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let query = build_query(list_params(params)?, DEFAULT_STRESS_LIMIT)?;
    let result = state.store.query_stress_events(&query);
    Ok(list_response(result.data, result.count, result.total_stored, &query))
}

const CBOT_ENDPOINTS: &[&str] = &[
    "POST /cbot/positions - Upsert an open position",
    "POST /cbot/trades - Record a closed trade",
    "POST /cbot/stress - Record a stress event",
    "GET /cbot/positions?symbol=&label=&limit= - Query positions",
    "GET /cbot/trades?symbol=&label=&limit= - Query trades",
    "GET /cbot/stress?symbol=&label=&limit= - Query stress events",
    "GET /cbot/status - Ingestion statistics",
];

// GET /cbot/status
pub async fn get_status(State(state): State<AppState>) -> Response {
    let now = Utc::now();
    let stats = stats::snapshot(&state.store, now);

    Json(json!({
        "success": true,
        "message": "cBot hybrid system active",
        "systemType": "hybrid-rest-push",
        "stats": stats,
        "lastActivity": stats.last_activity,
        "endpoints": CBOT_ENDPOINTS,
        "timestamp": now.to_rfc3339(),
    }))
    .into_response()
}
