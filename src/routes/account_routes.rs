use axum::{Router, routing::get};

use crate::{AppState, controllers::account_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/accounts/:account_id/positions", get(account_controller::get_account_positions))
        .route("/accounts/:account_id/trades", get(account_controller::get_account_trades))
}
