//! Quote and history types, and the data source contract

use crate::core::catalog::{ChartRange, Commodity};
use crate::core::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub commodity: Commodity,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Quotes as persisted between runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub quotes: Vec<Quote>,
    pub observed_at: Option<DateTime<Utc>>,
}

/// Puts quotes in catalog order and keeps the first quote seen per commodity.
pub fn normalize_quotes(quotes: Vec<Quote>) -> Vec<Quote> {
    let mut seen = HashSet::new();
    let mut unique: Vec<Quote> = quotes
        .into_iter()
        .filter(|q| seen.insert(q.commodity))
        .collect();
    unique.sort_by_key(|q| q.commodity.catalog_index());
    unique
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Current quotes for the catalog, in catalog order.
    async fn fetch_quotes(&self) -> Result<Vec<Quote>, FetchError>;

    /// Non-empty, chronologically ascending price history.
    async fn fetch_history(
        &self,
        commodity: Commodity,
        range: ChartRange,
    ) -> Result<Vec<PricePoint>, FetchError>;
}
