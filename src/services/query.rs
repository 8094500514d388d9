use std::cmp::Reverse;

use serde::Serialize;

use crate::models::StoredRecord;

pub const DEFAULT_POSITION_LIMIT: usize = 100;
pub const DEFAULT_TRADE_LIMIT: usize = 1000;
pub const DEFAULT_STRESS_LIMIT: usize = 100;

/// Read filters for one collection.
///
/// `symbol` matches as a case-insensitive substring while `label` matches as
/// a case-sensitive substring. The asymmetry is what existing cBots rely on.
/// `account_id` is an exact match and is only set by the account views.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub symbol: Option<String>,
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub limit: usize,
}

impl Query {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    pub fn symbol(mut self, symbol: Option<String>) -> Self {
        self.symbol = non_empty(symbol);
        self
    }

    pub fn label(mut self, label: Option<String>) -> Self {
        self.label = non_empty(label);
        self
    }

    pub fn account(mut self, account_id: Option<String>) -> Self {
        self.account_id = non_empty(account_id);
        self
    }

    pub fn matches<R: StoredRecord>(&self, record: &R) -> bool {
        if let Some(want) = &self.symbol {
            let Some(sym) = record.symbol() else {
                return false;
            };
            if !sym.to_lowercase().contains(&want.to_lowercase()) {
                return false;
            }
        }

        if let Some(want) = &self.label {
            match record.label() {
                Some(label) if label.contains(want.as_str()) => {}
                _ => return false,
            }
        }

        if let Some(want) = &self.account_id {
            if record.account_id() != Some(want.as_str()) {
                return false;
            }
        }

        true
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    pub data: Vec<T>,
    pub count: usize,
    pub total_stored: usize,
}

/// Filters `records` (oldest first), sorts by descending recency and keeps the
/// newest `query.limit`. Ties keep the later insert first.
///
/// Callers pass an iterator over a locked collection; only the matching
/// records are cloned out before sorting.
pub fn run<'a, R, I>(records: I, query: &Query) -> QueryResult<R>
where
    R: StoredRecord + Clone + 'a,
    I: DoubleEndedIterator<Item = &'a R> + ExactSizeIterator,
{
    let total_stored = records.len();

    let mut data: Vec<R> = records
        .rev()
        .filter(|r| query.matches(*r))
        .cloned()
        .collect();

    // stable: equal keys stay newest-insert first
    data.sort_by_cached_key(|r| Reverse(r.recency()));
    data.truncate(query.limit);

    QueryResult {
        count: data.len(),
        data,
        total_stored,
    }
}
