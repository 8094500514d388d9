use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::{
    controllers::cbot_controller::{list_params, parse_limit},
    errors::AppError,
    services::account_view::{self, DEFAULT_ACCOUNT_TRADE_LIMIT},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct AccountParams {
    pub symbol: Option<String>,
    pub label: Option<String>,
    pub limit: Option<String>,
}

// GET /accounts/:account_id/positions
pub async fn get_account_positions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    params: Result<Query<AccountParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = list_params(params)?;
    let now = Utc::now();
    let view = account_view::positions_for_account(
        &state.store,
        &account_id,
        params.symbol.clone(),
        params.label.clone(),
        now,
        state.settings.freshness_window(),
    );

    Ok(Json(json!({
        "accountId": view.account_id,
        "labelFilter": params.label.filter(|s| !s.is_empty()),
        "symbolFilter": params.symbol.filter(|s| !s.is_empty()),
        "positions": view.groups,
        "totalCount": view.total_count,
        "dataFreshness": view.data_freshness,
        "lastUpdate": view.last_update,
        "timestamp": now.to_rfc3339(),
        "source": "cBot-hybrid",
    }))
    .into_response())
}

// GET /accounts/:account_id/trades
pub async fn get_account_trades(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    params: Result<Query<AccountParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let params = list_params(params)?;
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_ACCOUNT_TRADE_LIMIT)?;

    let now = Utc::now();
    let view = account_view::trades_for_account(
        &state.store,
        &account_id,
        params.symbol.clone(),
        limit,
        now,
        state.settings.freshness_window(),
    );

    Ok(Json(json!({
        "accountId": view.account_id,
        "symbolFilter": params.symbol.filter(|s| !s.is_empty()),
        "trades": view.groups,
        "totalCount": view.total_count,
        "limit": limit,
        "dataFreshness": view.data_freshness,
        "lastUpdate": view.last_update,
        "timestamp": now.to_rfc3339(),
        "source": "cBot-hybrid",
    }))
    .into_response())
}
