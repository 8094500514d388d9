use axum::{Router, routing::get};

use crate::{AppState, controllers::broker_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/profile", get(broker_controller::get_profile))
        .route("/accounts", get(broker_controller::get_accounts))
        .route("/accounts/:account_id/balance", get(broker_controller::get_account_balance))
}
