use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::StoredRecord;

use super::ingestion_store::IngestionStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionStats {
    pub total: usize,
    /// Records whose recency key is within the last 24 hours.
    pub last_24h: usize,
    pub last_activity: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub positions: CollectionStats,
    pub trades: CollectionStats,
    pub stress_events: CollectionStats,
    /// Newest recency key across all collections.
    pub last_activity: Option<DateTime<Utc>>,
    pub total_accounts: usize,
    pub total_symbols: usize,
    pub account_activity: BTreeMap<String, DateTime<Utc>>,
}

#[derive(Default)]
struct Distinct {
    accounts: BTreeSet<String>,
    symbols: BTreeSet<String>,
}

impl Distinct {
    fn note(set: &mut BTreeSet<String>, value: Option<&str>) {
        if let Some(v) = value {
            if !set.contains(v) {
                set.insert(v.to_string());
            }
        }
    }
}

fn collect<'a, R, I>(records: I, cutoff: DateTime<Utc>, distinct: &mut Distinct) -> CollectionStats
where
    R: StoredRecord + 'a,
    I: Iterator<Item = &'a R>,
{
    let mut stats = CollectionStats::default();
    for r in records {
        let at = r.recency();
        stats.total += 1;
        if at >= cutoff {
            stats.last_24h += 1;
        }
        stats.last_activity = stats.last_activity.max(Some(at));

        Distinct::note(&mut distinct.accounts, r.account_id());
        Distinct::note(&mut distinct.symbols, r.symbol());
    }
    stats
}

/// Aggregates the store as of `now`. Empty collections give zeros and `None`.
pub fn snapshot(store: &IngestionStore, now: DateTime<Utc>) -> StoreStats {
    let cutoff = now - Duration::hours(24);
    let mut distinct = Distinct::default();

    let positions = store.read_positions(|log| collect(log.iter(), cutoff, &mut distinct));
    let trades = store.read_trades(|log| collect(log.iter(), cutoff, &mut distinct));
    let stress_events = store.read_stress_events(|log| collect(log.iter(), cutoff, &mut distinct));

    let account_activity: BTreeMap<String, DateTime<Utc>> =
        store.account_activity().into_iter().collect();
    distinct.accounts.extend(account_activity.keys().cloned());

    let last_activity = [
        positions.last_activity,
        trades.last_activity,
        stress_events.last_activity,
    ]
    .into_iter()
    .flatten()
    .max();

    StoreStats {
        positions,
        trades,
        stress_events,
        last_activity,
        total_accounts: distinct.accounts.len(),
        total_symbols: distinct.symbols.len(),
        account_activity,
    }
}
