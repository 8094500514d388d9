use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fields::{parse_timestamp, stamp_payload, text_field, StoredRecord};
use crate::errors::AppError;

/// A risk event (drawdown breach and the like) reported by the cBot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressEventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Value>,

    pub last_update: DateTime<Utc>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StressEventRecord {
    pub fn from_payload(payload: Map<String, Value>, now: DateTime<Utc>) -> Result<Self, AppError> {
        stamp_payload(payload, now, &["lastUpdate"])
    }
}

impl StoredRecord for StressEventRecord {
    fn symbol(&self) -> Option<&str> {
        text_field(&self.extra, "symbol")
    }

    fn label(&self) -> Option<&str> {
        text_field(&self.extra, "label")
    }

    fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    fn recency(&self) -> DateTime<Utc> {
        self.start_time
            .as_ref()
            .and_then(parse_timestamp)
            .unwrap_or(self.last_update)
    }
}
