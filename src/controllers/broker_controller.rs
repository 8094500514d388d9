use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::{errors::AppError, AppState};

// GET /profile
pub async fn get_profile(State(state): State<AppState>) -> Result<Response, AppError> {
    let data = state.broker.profile().await?;
    Ok(Json(data).into_response())
}

// GET /accounts
pub async fn get_accounts(State(state): State<AppState>) -> Result<Response, AppError> {
    let data = state.broker.trading_accounts().await?;
    Ok(Json(data).into_response())
}

// GET /accounts/:account_id/balance
pub async fn get_account_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Response, AppError> {
    let view = state.broker.account_balance(&account_id).await?;
    Ok(Json(view).into_response())
}
