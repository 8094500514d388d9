use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::models::{PositionRecord, StressEventRecord, TradeRecord};

use super::bounded_log::BoundedLog;
use super::query::{self, Query, QueryResult};

/// Retention caps per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_positions: usize,
    pub max_trades: usize,
    pub max_stress_events: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_positions: 1000,
            max_trades: 5000,
            max_stress_events: 500,
        }
    }
}

impl From<&Settings> for StoreLimits {
    fn from(s: &Settings) -> Self {
        Self {
            max_positions: s.max_positions,
            max_trades: s.max_trades,
            max_stress_events: s.max_stress_events,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Collection size after the write.
    pub total: usize,
    /// True when an existing position was replaced rather than appended.
    pub replaced: bool,
    pub evicted: usize,
}

/// Everything the cBot has pushed since the process started.
///
/// Each collection sits behind its own mutex: a write (upsert/append + evict)
/// or a read (filter + copy) runs entirely under one lock, so readers never
/// see a half-applied write. Collections are independent of each other.
#[derive(Debug)]
pub struct IngestionStore {
    positions: Mutex<BoundedLog<PositionRecord>>,
    trades: Mutex<BoundedLog<TradeRecord>>,
    stress_events: Mutex<BoundedLog<StressEventRecord>>,
    activity: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Default for IngestionStore {
    fn default() -> Self {
        Self::new(StoreLimits::default())
    }
}

// A panic mid-write cannot leave a BoundedLog inconsistent, so a poisoned
// lock is still safe to use.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl IngestionStore {
    pub fn new(limits: StoreLimits) -> Self {
        Self {
            positions: Mutex::new(BoundedLog::with_capacity(limits.max_positions)),
            trades: Mutex::new(BoundedLog::with_capacity(limits.max_trades)),
            stress_events: Mutex::new(BoundedLog::with_capacity(limits.max_stress_events)),
            activity: Mutex::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_positions: lock(&self.positions).capacity(),
            max_trades: lock(&self.trades).capacity(),
            max_stress_events: lock(&self.stress_events).capacity(),
        }
    }

    /// Inserts the position, or replaces the stored one with the same
    /// `(accountId, symbol, positionId)`.
    pub fn upsert_position(&self, record: PositionRecord) -> WriteReceipt {
        let activity = record.account_id.clone().map(|a| (a, record.last_update));

        let receipt = {
            let mut positions = lock(&self.positions);
            let (replaced, evicted) = positions.upsert(record, PositionRecord::same_identity);
            WriteReceipt {
                total: positions.len(),
                replaced,
                evicted,
            }
        };

        if let Some((account, at)) = activity {
            self.record_account_activity(&account, at);
        }
        receipt
    }

    /// Always appends, even when an identical trade is already stored.
    pub fn append_trade(&self, record: TradeRecord) -> WriteReceipt {
        let activity = record.account_id.clone().map(|a| (a, record.last_update));

        let receipt = {
            let mut trades = lock(&self.trades);
            let evicted = trades.push(record);
            WriteReceipt {
                total: trades.len(),
                replaced: false,
                evicted,
            }
        };

        if let Some((account, at)) = activity {
            self.record_account_activity(&account, at);
        }
        receipt
    }

    pub fn append_stress_event(&self, record: StressEventRecord) -> WriteReceipt {
        let activity = record.account_id.clone().map(|a| (a, record.last_update));

        let receipt = {
            let mut events = lock(&self.stress_events);
            let evicted = events.push(record);
            WriteReceipt {
                total: events.len(),
                replaced: false,
                evicted,
            }
        };

        if let Some((account, at)) = activity {
            self.record_account_activity(&account, at);
        }
        receipt
    }

    /// Moves the account's freshness marker forward; never backwards.
    pub fn record_account_activity(&self, account_id: &str, at: DateTime<Utc>) {
        let mut activity = lock(&self.activity);
        activity
            .entry(account_id.to_string())
            .and_modify(|last| {
                if at > *last {
                    *last = at;
                }
            })
            .or_insert(at);
    }

    pub fn last_activity(&self, account_id: &str) -> Option<DateTime<Utc>> {
        lock(&self.activity).get(account_id).copied()
    }

    pub fn account_activity(&self) -> HashMap<String, DateTime<Utc>> {
        lock(&self.activity).clone()
    }

    pub fn query_positions(&self, q: &Query) -> QueryResult<PositionRecord> {
        self.read_positions(|log| query::run(log.iter(), q))
    }

    pub fn query_trades(&self, q: &Query) -> QueryResult<TradeRecord> {
        self.read_trades(|log| query::run(log.iter(), q))
    }

    pub fn query_stress_events(&self, q: &Query) -> QueryResult<StressEventRecord> {
        self.read_stress_events(|log| query::run(log.iter(), q))
    }

    /// Full copies in insertion order (oldest first).
    pub fn positions(&self) -> Vec<PositionRecord> {
        self.read_positions(|log| log.iter().cloned().collect())
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        self.read_trades(|log| log.iter().cloned().collect())
    }

    pub fn stress_events(&self) -> Vec<StressEventRecord> {
        self.read_stress_events(|log| log.iter().cloned().collect())
    }

    // Read access for in-crate aggregations; `f` runs under the lock.
    pub(crate) fn read_positions<T>(&self, f: impl FnOnce(&BoundedLog<PositionRecord>) -> T) -> T {
        f(&*lock(&self.positions))
    }

    pub(crate) fn read_trades<T>(&self, f: impl FnOnce(&BoundedLog<TradeRecord>) -> T) -> T {
        f(&*lock(&self.trades))
    }

    pub(crate) fn read_stress_events<T>(
        &self,
        f: impl FnOnce(&BoundedLog<StressEventRecord>) -> T,
    ) -> T {
        f(&*lock(&self.stress_events))
    }
}
