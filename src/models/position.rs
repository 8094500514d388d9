use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields::{stamp_payload, text_field, Identifier, StoredRecord};
use crate::errors::AppError;

/// An open position as last reported by the cBot.
///
/// Identity is `(accountId, symbol, positionId)`; anything else the bot sends
/// (`tradeType`, `volume`, `label`, `netProfit`, ...) rides along untyped in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub symbol: String,
    pub position_id: Identifier,

    pub last_update: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PositionRecord {
    pub fn from_payload(payload: Map<String, Value>, now: DateTime<Utc>) -> Result<Self, AppError> {
        let has_symbol = matches!(payload.get("symbol"), Some(Value::String(s)) if !s.trim().is_empty());
        let has_id = match payload.get("positionId") {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(n)) => n.is_i64(),
            _ => false,
        };
        if !has_symbol || !has_id {
            return Err(AppError::Validation(
                "Missing required fields: symbol, positionId".to_string(),
            ));
        }

        stamp_payload(payload, now, &["lastUpdate"])
    }

    pub fn same_identity(&self, other: &PositionRecord) -> bool {
        self.position_id == other.position_id
            && self.symbol == other.symbol
            && self.account_id == other.account_id
    }
}

impl StoredRecord for PositionRecord {
    fn symbol(&self) -> Option<&str> {
        Some(&self.symbol)
    }

    fn label(&self) -> Option<&str> {
        text_field(&self.extra, "label")
    }

    fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    fn recency(&self) -> DateTime<Utc> {
        self.last_update
    }
}
