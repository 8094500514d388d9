use axum::{extract::rejection::JsonRejection, http::HeaderMap, Json};
use serde_json::{Map, Value};

use crate::{config::Settings, errors::AppError};

pub const AUTH_HEADER: &str = "X-Auth-Token";

fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Gate in front of every push endpoint.
///
/// The shared secret comes from the `X-Auth-Token` header or the body's
/// `authToken` field (header first). It is checked before the body shape, so a
/// rejected push never reaches the store. On success the body object is
/// returned without its `authToken`.
pub fn authorize_push(
    settings: &Settings,
    headers: &HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Map<String, Value>, AppError> {
    let body = payload.map(|Json(v)| v);

    let supplied = header_token(headers).or_else(|| {
        body.as_ref()
            .ok()
            .and_then(|v| v.get("authToken"))
            .and_then(Value::as_str)
    });

    if supplied != Some(settings.cbot_auth_token.as_str()) {
        tracing::warn!("push rejected: invalid auth token");
        return Err(AppError::Auth("Invalid auth token".to_string()));
    }

    match body {
        Ok(Value::Object(mut map)) => {
            map.remove("authToken");
            Ok(map)
        }
        Ok(_) => Err(AppError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
        Err(rejection) => Err(AppError::Validation(rejection.body_text())),
    }
}
