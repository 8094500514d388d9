use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{PositionRecord, StoredRecord, TradeRecord};

use super::ingestion_store::IngestionStore;
use super::query::Query;

pub const DEFAULT_ACCOUNT_TRADE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Freshness {
    Fresh,
    Stale,
}

/// Fresh when the last write is strictly less than `window` old. No write at
/// all is stale.
pub fn classify(last: Option<DateTime<Utc>>, now: DateTime<Utc>, window: Duration) -> Freshness {
    match last {
        Some(at) if now - at < window => Freshness::Fresh,
        _ => Freshness::Stale,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolPositions {
    pub symbol: String,
    pub positions: Vec<PositionRecord>,
    pub last_update: Option<DateTime<Utc>>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolTrades {
    pub symbol: String,
    pub trades: Vec<TradeRecord>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPositions {
    pub account_id: String,
    pub groups: Vec<SymbolPositions>,
    pub total_count: usize,
    pub data_freshness: Freshness,
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountTrades {
    pub account_id: String,
    pub groups: Vec<SymbolTrades>,
    pub total_count: usize,
    pub data_freshness: Freshness,
    pub last_update: Option<DateTime<Utc>>,
}

// Account views match the symbol exactly, unlike the `/cbot/*` reads.
fn exact_symbol<R: StoredRecord>(symbol: Option<&str>) -> impl Fn(&R) -> bool + '_ {
    move |r: &R| symbol.map_or(true, |want| r.symbol() == Some(want))
}

/// Open positions of one account, grouped by symbol (alphabetical), newest
/// first inside each group. `symbol` must match exactly.
pub fn positions_for_account(
    store: &IngestionStore,
    account_id: &str,
    symbol: Option<String>,
    label: Option<String>,
    now: DateTime<Utc>,
    window: Duration,
) -> AccountPositions {
    let symbol = symbol.filter(|s| !s.is_empty());
    let query = Query::new(store.limits().max_positions)
        .account(Some(account_id.to_string()))
        .label(label);
    let result = store.query_positions(&query);

    let mut by_symbol: BTreeMap<String, Vec<PositionRecord>> = BTreeMap::new();
    for p in result.data.into_iter().filter(exact_symbol(symbol.as_deref())) {
        by_symbol.entry(p.symbol.clone()).or_default().push(p);
    }

    let groups: Vec<SymbolPositions> = by_symbol
        .into_iter()
        .map(|(symbol, positions)| SymbolPositions {
            last_update: positions.iter().map(|p| p.recency()).max(),
            count: positions.len(),
            symbol,
            positions,
        })
        .collect();

    let last_update = store.last_activity(account_id);

    AccountPositions {
        account_id: account_id.to_string(),
        total_count: groups.iter().map(|g| g.count).sum(),
        groups,
        data_freshness: classify(last_update, now, window),
        last_update,
    }
}

/// Closed trades of one account grouped by symbol, each group keeping its
/// `per_symbol_limit` most recent trades. `symbol` must match exactly.
pub fn trades_for_account(
    store: &IngestionStore,
    account_id: &str,
    symbol: Option<String>,
    per_symbol_limit: usize,
    now: DateTime<Utc>,
    window: Duration,
) -> AccountTrades {
    let symbol = symbol.filter(|s| !s.is_empty());
    let query = Query::new(store.limits().max_trades).account(Some(account_id.to_string()));
    let result = store.query_trades(&query);

    let mut by_symbol: BTreeMap<String, Vec<TradeRecord>> = BTreeMap::new();
    for t in result.data.into_iter().filter(exact_symbol(symbol.as_deref())) {
        let key = t.symbol().unwrap_or_default().to_string();
        let group = by_symbol.entry(key).or_default();
        if group.len() < per_symbol_limit {
            group.push(t);
        }
    }

    let groups: Vec<SymbolTrades> = by_symbol
        .into_iter()
        .map(|(symbol, trades)| SymbolTrades {
            count: trades.len(),
            symbol,
            trades,
        })
        .collect();

    let last_update = store.last_activity(account_id);

    AccountTrades {
        account_id: account_id.to_string(),
        total_count: groups.iter().map(|g| g.count).sum(),
        groups,
        data_freshness: classify(last_update, now, window),
        last_update,
    }
}
