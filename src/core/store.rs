//! Persistence abstractions

use crate::core::catalog::Commodity;
use crate::core::quote::CacheSnapshot;
use crate::filter::Filter;
use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

pub const QUOTE_CACHE_KEY: &str = "quote_cache";
pub const FAVORITES_KEY: &str = "favorites";
pub const FILTER_KEY: &str = "filter";

/// An opaque, durable key-value store.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed access to the entries the app persists.
///
/// Reads never fail: a missing or unreadable entry is reported as absent.
#[derive(Clone)]
pub struct StateStore {
    inner: Arc<dyn KeyValueStore>,
}

impl StateStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let res: Result<Option<T>> = (|| {
            let Some(bytes) = self.inner.get(key)? else {
                return Ok(None);
            };
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to decode stored entry: {key}"))?;
            Ok(Some(value))
        })();

        match res {
            Ok(value) => {
                debug!(key, found = value.is_some(), "Read stored entry");
                value
            }
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable stored entry");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.inner
            .put(key, &bytes)
            .with_context(|| format!("Failed to write stored entry: {key}"))
    }

    pub fn load_snapshot(&self) -> Option<CacheSnapshot> {
        self.read(QUOTE_CACHE_KEY)
    }

    pub fn save_snapshot(&self, snapshot: &CacheSnapshot) -> Result<()> {
        self.write(QUOTE_CACHE_KEY, snapshot)
    }

    pub fn remove_snapshot(&self) -> Result<()> {
        self.inner
            .remove(QUOTE_CACHE_KEY)
            .context("Failed to remove cached quotes")
    }

    /// Unknown symbols are skipped.
    pub fn load_favorites(&self) -> HashSet<Commodity> {
        self.read::<Vec<String>>(FAVORITES_KEY)
            .unwrap_or_default()
            .iter()
            .filter_map(|symbol| Commodity::from_symbol(symbol))
            .collect()
    }

    pub fn save_favorites(&self, favorites: &HashSet<Commodity>) -> Result<()> {
        let mut ordered: Vec<Commodity> = favorites.iter().copied().collect();
        ordered.sort();
        let symbols: Vec<&str> = ordered.iter().map(|c| c.symbol()).collect();
        self.write(FAVORITES_KEY, &symbols)
    }

    pub fn load_filter(&self) -> Filter {
        self.read(FILTER_KEY).unwrap_or_default()
    }

    pub fn save_filter(&self, filter: Filter) -> Result<()> {
        self.write(FILTER_KEY, &filter)
    }
}
