use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::AppError;

/// Broker-assigned id. cBots send these either as numbers or as strings, and
/// the two forms are kept apart (`123` and `"123"` are different ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{n}"),
            Identifier::Text(s) => f.write_str(s),
        }
    }
}

/// Read side shared by every stored collection.
pub trait StoredRecord {
    fn symbol(&self) -> Option<&str>;
    fn label(&self) -> Option<&str>;
    fn account_id(&self) -> Option<&str>;
    /// Timestamp used for ordering and recency windows.
    fn recency(&self) -> DateTime<Utc>;
}

// Keys the store owns; whatever the sender put there is dropped.
const STORE_KEYS: &[&str] = &["authToken", "lastUpdate", "receivedAt"];

/// Turns a raw push body into a record: strips store-owned keys, normalizes a
/// numeric `accountId` to a string, stamps `stamp_keys` with `now`.
pub(crate) fn stamp_payload<T: DeserializeOwned>(
    mut payload: Map<String, Value>,
    now: DateTime<Utc>,
    stamp_keys: &[&str],
) -> Result<T, AppError> {
    for key in STORE_KEYS {
        payload.remove(*key);
    }

    match payload.get("accountId") {
        Some(Value::Number(n)) => {
            let s = account_id_text(n);
            payload.insert("accountId".into(), Value::String(s));
        }
        Some(Value::Null) => {
            payload.remove("accountId");
        }
        Some(Value::String(_)) | None => {}
        Some(_) => {
            return Err(AppError::Validation(
                "accountId must be a string or a number".to_string(),
            ))
        }
    }

    let stamp = Value::String(now.to_rfc3339());
    for key in stamp_keys {
        payload.insert((*key).to_string(), stamp.clone());
    }

    serde_json::from_value(Value::Object(payload))
        .map_err(|e| AppError::Validation(format!("Invalid payload: {e}")))
}

// Integral numbers lose any float notation so `1e3` and `1000` name the same
// account as the `/accounts/1000` path.
fn account_id_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // 2^53: past this an f64 no longer holds every integer
        Some(f) if f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_992.0 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

/// String value of a free-form field; other JSON types read as absent.
pub(crate) fn text_field<'a>(extra: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    extra.get(key).and_then(Value::as_str)
}

/// Parses the time fields cBots send: RFC 3339, naive `YYYY-MM-DD HH:MM:SS`
/// (read as UTC), or epoch seconds / milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time_str(s.trim()),
        Value::Number(n) => {
            let raw = n.as_f64()?;
            if !raw.is_finite() || raw < 0.0 {
                return None;
            }
            // anything past 1e11 cannot be seconds (year 5138)
            let millis = if raw > 1e11 { raw } else { raw * 1000.0 };
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        _ => None,
    }
}

fn parse_time_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}
