use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use ctrader_bridge::{config, routes, AppState};
use tower::ServiceExt;

const TOKEN: &str = "test-bridge-token";

fn test_state() -> AppState {
    let mut settings = config::load();
    settings.cbot_auth_token = TOKEN.to_string();
    settings.max_positions = 1000;
    settings.max_trades = 5000;
    settings.max_stress_events = 500;
    settings.freshness_window_secs = 300;
    AppState::new(settings)
}

fn app(state: &AppState) -> Router {
    routes::app(state.clone())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn response_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn post_position_with_bad_token_is_401_and_store_untouched() {
    let state = test_state();

    let res = app(&state)
        .oneshot(post_json(
            "/cbot/positions",
            json!({"symbol": "EURUSD", "positionId": 1, "authToken": "wrong"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(res).await;
    assert_eq!(body["error"], "Invalid auth token");
    assert!(state.store.positions().is_empty());
    assert_eq!(state.store.last_activity("1"), None);
}

#[tokio::test]
async fn bad_token_is_rejected_before_shape_validation() {
    let state = test_state();

    // missing required fields and no token: auth wins
    let res = app(&state)
        .oneshot(post_json("/cbot/positions", json!({"symbol": "EURUSD"})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    for uri in ["/cbot/trades", "/cbot/stress"] {
        let res = app(&state)
            .oneshot(post_json(uri, json!({"symbol": "EURUSD", "authToken": "nope"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
    assert!(state.store.trades().is_empty());
    assert!(state.store.stress_events().is_empty());
}

#[tokio::test]
async fn post_position_missing_fields_is_400() {
    let state = test_state();

    let res = app(&state)
        .oneshot(post_json("/cbot/positions", json!({"symbol": "EURUSD", "authToken": TOKEN})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = response_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("positionId"));
    assert!(state.store.positions().is_empty());
}

#[tokio::test]
async fn malformed_json_is_400_once_authenticated() {
    let state = test_state();

    let req = Request::builder()
        .method("POST")
        .uri("/cbot/trades")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Auth-Token", TOKEN)
        .body(Body::from("{not json"))
        .unwrap();
    let res = app(&state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = Request::builder()
        .method("POST")
        .uri("/cbot/trades")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app(&state).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_object_body_is_400() {
    let state = test_state();

    let req = Request::builder()
        .method("POST")
        .uri("/cbot/stress")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Auth-Token", TOKEN)
        .body(Body::from("[1, 2, 3]"))
        .unwrap();
    let res = app(&state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.stress_events().is_empty());
}

#[tokio::test]
async fn post_position_upserts_and_reports_totals() {
    let state = test_state();

    let payload = json!({
        "accountId": "5150",
        "symbol": "EURUSD",
        "positionId": 101,
        "tradeType": "Buy",
        "volume": 10000.0,
        "label": "AIGridBot_EURUSD",
        "netProfit": 4.2,
        "authToken": TOKEN,
    });

    let res = app(&state).oneshot(post_json("/cbot/positions", payload.clone())).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalPositions"], 1);
    assert_eq!(body["positionId"], 101);
    assert!(body["timestamp"].is_string());

    let mut second = payload;
    second["netProfit"] = json!(-1.0);
    let res = app(&state).oneshot(post_json("/cbot/positions", second)).await.unwrap();
    let body = response_json(res).await;
    assert_eq!(body["totalPositions"], 1);
    assert_eq!(body["message"], "Position updated");

    let stored = state.store.positions();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].extra["netProfit"], json!(-1.0));
    assert!(!stored[0].extra.contains_key("authToken"));
    assert!(state.store.last_activity("5150").is_some());
}

#[tokio::test]
async fn identical_trades_are_appended_twice() {
    let state = test_state();
    let payload = json!({"symbol": "EURUSD", "tradeType": "Sell", "netProfit": 3.0, "authToken": TOKEN});

    app(&state).oneshot(post_json("/cbot/trades", payload.clone())).await.unwrap();
    let res = app(&state).oneshot(post_json("/cbot/trades", payload)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["totalTrades"], 2);
    assert_eq!(state.store.trades().len(), 2);
}

#[tokio::test]
async fn header_token_is_accepted() {
    let state = test_state();

    let req = Request::builder()
        .method("POST")
        .uri("/cbot/stress")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Auth-Token", TOKEN)
        .body(Body::from(json!({"symbol": "XAUUSD", "maxDrawdown": 12.5}).to_string()))
        .unwrap();
    let res = app(&state).oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["totalStressEvents"], 1);
}

#[tokio::test]
async fn get_positions_filters_and_reports_totals() {
    let state = test_state();
    for (id, symbol) in [(1, "EURUSD"), (2, "GBPUSD"), (3, "EURJPY")] {
        app(&state)
            .oneshot(post_json(
                "/cbot/positions",
                json!({"symbol": symbol, "positionId": id, "authToken": TOKEN}),
            ))
            .await
            .unwrap();
    }

    let res = app(&state).oneshot(get("/cbot/positions?symbol=eur")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["totalStored"], 3);
    assert_eq!(body["filters"]["symbol"], "eur");
    assert_eq!(body["filters"]["label"], Value::Null);
    assert_eq!(body["filters"]["limit"], 100);

    let mut symbols: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["symbol"].as_str().unwrap())
        .collect();
    symbols.sort();
    assert_eq!(symbols, vec!["EURJPY", "EURUSD"]);
}

#[tokio::test]
async fn get_trades_respects_limit_and_exit_time_order() {
    let state = test_state();
    for minute in 0..10 {
        let exit = format!("2026-03-02T10:{minute:02}:00Z");
        app(&state)
            .oneshot(post_json(
                "/cbot/trades",
                json!({"symbol": "EURUSD", "exitTime": exit, "authToken": TOKEN}),
            ))
            .await
            .unwrap();
    }

    let res = app(&state).oneshot(get("/cbot/trades?limit=3")).await.unwrap();
    let body = response_json(res).await;

    let exits: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["exitTime"].as_str().unwrap())
        .collect();
    assert_eq!(
        exits,
        vec!["2026-03-02T10:09:00Z", "2026-03-02T10:08:00Z", "2026-03-02T10:07:00Z"]
    );
    assert_eq!(body["count"], 3);
    assert_eq!(body["totalStored"], 10);
}

#[tokio::test]
async fn invalid_limit_is_400() {
    let state = test_state();
    let res = app(&state).oneshot(get("/cbot/stress?limit=many")).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = response_json(res).await;
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn free_form_fields_of_unexpected_types_are_stored() {
    let state = test_state();
    let pushes = [
        ("/cbot/trades", json!({"symbol": "EURUSD", "netProfit": "12.50"})),
        ("/cbot/trades", json!({"symbol": 12345})),
        ("/cbot/stress", json!({"symbol": "XAUUSD", "maxDrawdown": "4.2%"})),
        ("/cbot/positions", json!({"symbol": "EURUSD", "positionId": 1, "volume": "10000"})),
        ("/cbot/positions", json!({"symbol": "EURUSD", "positionId": 2, "label": 7})),
    ];

    for (uri, mut payload) in pushes {
        payload["authToken"] = json!(TOKEN);
        let res = app(&state).oneshot(post_json(uri, payload.clone())).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK, "{uri} {payload}");
    }

    assert_eq!(state.store.trades().len(), 2);
    assert_eq!(state.store.stress_events().len(), 1);
    assert_eq!(state.store.positions().len(), 2);

    let body = response_json(app(&state).oneshot(get("/cbot/trades")).await.unwrap()).await;
    let profits: Vec<&Value> = body["data"].as_array().unwrap().iter().map(|t| &t["netProfit"]).collect();
    assert!(profits.contains(&&json!("12.50")));
}

#[tokio::test]
async fn malformed_query_string_is_a_json_400() {
    let state = test_state();
    let res = app(&state).oneshot(get("/cbot/trades?symbol=A&symbol=B")).await.unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = response_json(res).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn status_on_empty_store_is_all_zero() {
    let state = test_state();
    let res = app(&state).oneshot(get("/cbot/status")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = response_json(res).await;
    assert_eq!(body["lastActivity"], Value::Null);
    assert_eq!(body["stats"]["positions"]["total"], 0);
    assert_eq!(body["stats"]["trades"]["total"], 0);
    assert_eq!(body["stats"]["stressEvents"]["total"], 0);
    assert_eq!(body["stats"]["trades"]["last24h"], 0);
    assert_eq!(body["stats"]["totalAccounts"], 0);
    assert!(body["endpoints"].as_array().unwrap().len() > 3);
}

#[tokio::test]
async fn status_counts_after_pushes() {
    let state = test_state();
    app(&state)
        .oneshot(post_json("/cbot/positions", json!({"symbol": "EURUSD", "positionId": 1, "accountId": 77, "authToken": TOKEN})))
        .await
        .unwrap();
    app(&state)
        .oneshot(post_json("/cbot/trades", json!({"symbol": "GBPUSD", "authToken": TOKEN})))
        .await
        .unwrap();

    let body = response_json(app(&state).oneshot(get("/cbot/status")).await.unwrap()).await;
    assert_eq!(body["stats"]["positions"]["total"], 1);
    assert_eq!(body["stats"]["positions"]["last24h"], 1);
    assert_eq!(body["stats"]["trades"]["total"], 1);
    assert_eq!(body["stats"]["totalSymbols"], 2);
    assert!(body["stats"]["accountActivity"]["77"].is_string());
    assert!(body["lastActivity"].is_string());
}

#[tokio::test]
async fn unknown_route_lists_valid_endpoints() {
    let state = test_state();
    let res = app(&state).oneshot(get("/nope")).await.unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = response_json(res).await;
    assert_eq!(body["error"], "Endpoint not found");
    assert!(body["availableEndpoints"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e == "/cbot/status"));
}
