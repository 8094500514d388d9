use axum::{Router, routing::get};

use crate::{AppState, controllers::cbot_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/cbot/positions",
            get(cbot_controller::get_positions).post(cbot_controller::post_position),
        )
        .route(
            "/cbot/trades",
            get(cbot_controller::get_trades).post(cbot_controller::post_trade),
        )
        .route(
            "/cbot/stress",
            get(cbot_controller::get_stress_events).post(cbot_controller::post_stress_event),
        )
        .route("/cbot/status", get(cbot_controller::get_status))
}
