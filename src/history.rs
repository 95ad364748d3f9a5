//! Cache of price histories keyed by commodity and chart range.

use crate::core::{ChartRange, Commodity, FetchError, PricePoint};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::debug;

pub type HistoryResult = Result<Vec<PricePoint>, FetchError>;
pub type PendingFetch = Shared<BoxFuture<'static, HistoryResult>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub commodity: Commodity,
    pub range: ChartRange,
}

impl HistoryKey {
    pub fn new(commodity: Commodity, range: ChartRange) -> Self {
        Self { commodity, range }
    }
}

impl Display for HistoryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.commodity.symbol(), self.range)
    }
}

/// A joined or newly started fetch.
pub struct FetchTicket {
    pub id: u64,
    pub fetch: PendingFetch,
    pub started: bool,
}

struct Pending {
    id: u64,
    fetch: PendingFetch,
    waiters: usize,
}

/// Entries are never evicted; the key space is the small catalog x range product.
#[derive(Default)]
pub struct HistoryCache {
    entries: HashMap<HistoryKey, Vec<PricePoint>>,
    pending: HashMap<HistoryKey, Pending>,
    next_id: u64,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HistoryKey) -> Option<&Vec<PricePoint>> {
        let entry = self.entries.get(key).filter(|points| !points.is_empty());
        if entry.is_some() {
            debug!("History cache HIT for {}", key);
        } else {
            debug!("History cache MISS for {}", key);
        }
        entry
    }

    /// Empty series are not stored.
    pub fn insert(&mut self, key: HistoryKey, points: Vec<PricePoint>) {
        if points.is_empty() {
            return;
        }
        debug!("History cache PUT for {} ({} points)", key, points.len());
        self.entries.insert(key, points);
    }

    pub fn is_pending(&self, key: &HistoryKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Joins the pending fetch for `key`, or starts one with `start`.
    pub fn join_or_start<F>(&mut self, key: HistoryKey, start: F) -> FetchTicket
    where
        F: FnOnce() -> BoxFuture<'static, HistoryResult>,
    {
        if let Some(pending) = self.pending.get_mut(&key) {
            debug!("Joining pending history fetch for {}", key);
            pending.waiters += 1;
            return FetchTicket {
                id: pending.id,
                fetch: pending.fetch.clone(),
                started: false,
            };
        }

        let id = self.next_id;
        self.next_id += 1;
        let fetch = start().shared();
        self.pending.insert(
            key,
            Pending {
                id,
                fetch: fetch.clone(),
                waiters: 1,
            },
        );
        FetchTicket {
            id,
            fetch,
            started: true,
        }
    }

    /// Marks the fetch `id` for `key` as done. Only the first caller gets
    /// `true` and is responsible for applying the result.
    pub fn finish(&mut self, key: &HistoryKey, id: u64) -> bool {
        match self.pending.get(key) {
            Some(pending) if pending.id == id => {
                self.pending.remove(key);
                true
            }
            _ => false,
        }
    }

    /// Withdraws one waiter of fetch `id` for `key` without a result. When
    /// no waiter is left the fetch is dropped and `true` is returned.
    pub fn abandon(&mut self, key: &HistoryKey, id: u64) -> bool {
        let Some(pending) = self.pending.get_mut(key).filter(|p| p.id == id) else {
            return false;
        };
        pending.waiters = pending.waiters.saturating_sub(1);
        if pending.waiters > 0 {
            return false;
        }
        debug!("History fetch for {} abandoned by all callers", key);
        self.pending.remove(key);
        true
    }
}
