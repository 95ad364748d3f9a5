//! Owner of quote state: refreshes, stale fallback, favorites, filter and
//! the detail-history selection.

use crate::core::quote::normalize_quotes;
use crate::core::{
    CacheSnapshot, ChartRange, Commodity, DataSource, FetchError, KeyValueStore, PricePoint,
    Quote, StateStore,
};
use crate::favorites::FavoritesRegistry;
use crate::filter::{Filter, project};
use crate::history::{HistoryCache, HistoryKey};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub const LOADED_CACHED_NOTICE: &str = "Loaded cached prices.";
pub const SHOWING_LAST_KNOWN_NOTICE: &str = "Showing last known prices.";
pub const CACHE_CLEARED_NOTICE: &str = "Cached prices cleared.";

/// Snapshot of everything a display needs, published after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteState {
    pub quotes: Vec<Quote>,
    pub last_updated: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
    pub filter: Filter,
    pub favorites: HashSet<Commodity>,
    pub selection: Option<HistoryKey>,
    pub visible_history: Option<Vec<PricePoint>>,
    pub is_history_loading: bool,
    pub history_error: Option<String>,
}

impl QuoteState {
    pub fn visible_quotes(&self) -> Vec<Quote> {
        project(&self.quotes, self.filter, &self.favorites)
    }
}

struct Inner {
    quotes: Vec<Quote>,
    last_updated: Option<DateTime<Utc>>,
    is_loading: bool,
    error_message: Option<String>,
    info_message: Option<String>,
    filter: Filter,
    favorites: FavoritesRegistry,
    history: HistoryCache,
    selection: Option<HistoryKey>,
    visible_history: Option<Vec<PricePoint>>,
    history_error: Option<String>,
}

impl Inner {
    fn snapshot(&self) -> QuoteState {
        QuoteState {
            quotes: self.quotes.clone(),
            last_updated: self.last_updated,
            is_loading: self.is_loading,
            error_message: self.error_message.clone(),
            info_message: self.info_message.clone(),
            filter: self.filter,
            favorites: self.favorites.as_set().clone(),
            selection: self.selection,
            visible_history: self.visible_history.clone(),
            is_history_loading: self
                .selection
                .is_some_and(|key| self.history.is_pending(&key)),
            history_error: self.history_error.clone(),
        }
    }
}

pub struct QuoteSyncCoordinator {
    source: Arc<dyn DataSource>,
    store: StateStore,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<QuoteState>,
}

impl QuoteSyncCoordinator {
    /// Creates the coordinator and seeds it from whatever the store holds.
    pub fn new(source: Arc<dyn DataSource>, store: Arc<dyn KeyValueStore>) -> Self {
        let store = StateStore::new(store);
        let mut inner = Inner {
            quotes: Vec::new(),
            last_updated: None,
            is_loading: false,
            error_message: None,
            info_message: None,
            filter: store.load_filter(),
            favorites: FavoritesRegistry::load(store.clone()),
            history: HistoryCache::new(),
            selection: None,
            visible_history: None,
            history_error: None,
        };
        Self::initialize_from_store(&store, &mut inner);

        let (state_tx, _) = watch::channel(inner.snapshot());
        Self {
            source,
            store,
            inner: Mutex::new(inner),
            state_tx,
        }
    }

    fn initialize_from_store(store: &StateStore, inner: &mut Inner) {
        let Some(snapshot) = store.load_snapshot() else {
            debug!("No cached quotes found");
            return;
        };
        inner.quotes = normalize_quotes(snapshot.quotes);
        inner.last_updated = snapshot.observed_at;
        inner.info_message = Some(LOADED_CACHED_NOTICE.to_string());
        info!(count = inner.quotes.len(), "Loaded cached quotes");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.snapshot());
    }

    pub fn subscribe(&self) -> watch::Receiver<QuoteState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> QuoteState {
        self.state_tx.borrow().clone()
    }

    pub fn visible_quotes(&self) -> Vec<Quote> {
        self.state_tx.borrow().visible_quotes()
    }

    /// Fetches fresh quotes. Returns immediately if a refresh is already running.
    ///
    /// On failure the previous quotes stay in place and the error is reported
    /// through [`QuoteState::error_message`].
    pub async fn refresh(&self) {
        if let Some(loading) = self.begin_refresh() {
            self.complete_refresh(loading).await;
        }
    }

    /// Marks a refresh as in progress, or returns `None` if one already is.
    pub(crate) fn begin_refresh(&self) -> Option<LoadingGuard<'_>> {
        let mut inner = self.lock();
        if inner.is_loading {
            debug!("Refresh already in progress, skipping");
            return None;
        }
        inner.is_loading = true;
        inner.error_message = None;
        self.publish(&inner);
        Some(LoadingGuard::new(self))
    }

    pub(crate) async fn complete_refresh(&self, loading: LoadingGuard<'_>) {
        debug!("Fetching quotes");
        let result = self.source.fetch_quotes().await;
        loading.disarm();
        self.apply_refresh(result);
    }

    fn apply_refresh(&self, result: Result<Vec<Quote>, FetchError>) {
        let mut inner = self.lock();
        match result {
            Ok(quotes) => {
                let now = Utc::now();
                inner.quotes = normalize_quotes(quotes);
                inner.last_updated = Some(now);
                inner.error_message = None;
                inner.info_message = None;

                let snapshot = CacheSnapshot {
                    quotes: inner.quotes.clone(),
                    observed_at: Some(now),
                };
                if let Err(e) = self.store.save_snapshot(&snapshot) {
                    warn!(error = %e, "Failed to persist quote snapshot");
                }
                info!(count = inner.quotes.len(), "Quotes refreshed");
            }
            Err(e) => {
                warn!(error = ?e, "Quote refresh failed");
                inner.error_message = Some(e.to_string());
                if !inner.quotes.is_empty() {
                    inner.info_message = Some(SHOWING_LAST_KNOWN_NOTICE.to_string());
                }
            }
        }
        inner.is_loading = false;
        self.publish(&inner);
    }

    /// Drops the persisted snapshot and the in-memory quotes.
    pub fn clear_cached_quotes(&self) {
        if let Err(e) = self.store.remove_snapshot() {
            warn!(error = %e, "Failed to remove persisted quotes");
        }

        let mut inner = self.lock();
        inner.quotes.clear();
        inner.last_updated = None;
        inner.error_message = None;
        inner.info_message = Some(CACHE_CLEARED_NOTICE.to_string());
        info!("Cleared cached quotes");
        self.publish(&inner);
    }

    pub fn set_filter(&self, filter: Filter) {
        let mut inner = self.lock();
        inner.filter = filter;
        if let Err(e) = self.store.save_filter(filter) {
            warn!(error = %e, "Failed to persist filter");
        }
        debug!(%filter, "Filter changed");
        self.publish(&inner);
    }

    pub fn is_favorite(&self, commodity: Commodity) -> bool {
        self.lock().favorites.is_favorite(commodity)
    }

    /// Returns whether `commodity` is a favorite after the toggle.
    pub fn toggle_favorite(&self, commodity: Commodity) -> bool {
        let mut inner = self.lock();
        let now_favorite = inner.favorites.toggle(commodity);
        self.publish(&inner);
        now_favorite
    }

    /// Selects `(commodity, range)` for display and loads its history.
    ///
    /// A cached series is shown without a fetch unless `force` is set. Calls
    /// for a key whose fetch is still pending join that fetch. A response that
    /// arrives after the selection moved on is cached but not shown.
    pub async fn load_history(&self, commodity: Commodity, range: ChartRange, force: bool) {
        let key = HistoryKey::new(commodity, range);

        let ticket = {
            let mut inner = self.lock();
            inner.selection = Some(key);

            if !force {
                if let Some(points) = inner.history.get(&key).cloned() {
                    inner.visible_history = Some(points);
                    inner.history_error = None;
                    self.publish(&inner);
                    return;
                }
            }

            inner.visible_history = inner.history.get(&key).cloned();
            inner.history_error = None;
            let source = Arc::clone(&self.source);
            let ticket = inner.history.join_or_start(key, move || {
                async move { source.fetch_history(commodity, range).await }.boxed()
            });
            if ticket.started {
                debug!("Fetching history for {}", key);
            }
            self.publish(&inner);
            ticket
        };

        let waiting = HistoryWaitGuard::new(self, key, ticket.id);
        let result = ticket.fetch.await;
        waiting.disarm();

        let mut inner = self.lock();
        if !inner.history.finish(&key, ticket.id) {
            return;
        }

        let still_selected = inner.selection == Some(key);
        match result {
            Ok(points) => {
                if still_selected {
                    inner.visible_history = Some(points.clone());
                    inner.history_error = None;
                } else {
                    debug!("Selection moved on, caching history for {} only", key);
                }
                inner.history.insert(key, points);
            }
            Err(e) => {
                warn!(error = ?e, %key, "History fetch failed");
                if still_selected {
                    inner.visible_history = inner.history.get(&key).cloned();
                    inner.history_error = Some(e.to_string());
                }
            }
        }
        self.publish(&inner);
    }

    /// Closes the detail view. Pending history fetches still fill the cache.
    pub fn clear_selection(&self) {
        let mut inner = self.lock();
        inner.selection = None;
        inner.visible_history = None;
        inner.history_error = None;
        self.publish(&inner);
    }
}

/// Clears the loading flag if a refresh is dropped before its fetch resolves.
pub(crate) struct LoadingGuard<'a> {
    coordinator: Option<&'a QuoteSyncCoordinator>,
}

impl<'a> LoadingGuard<'a> {
    fn new(coordinator: &'a QuoteSyncCoordinator) -> Self {
        Self {
            coordinator: Some(coordinator),
        }
    }

    fn disarm(mut self) {
        self.coordinator = None;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator {
            debug!("Refresh cancelled before completion");
            let mut inner = coordinator.lock();
            inner.is_loading = false;
            coordinator.publish(&inner);
        }
    }
}

/// Withdraws a `load_history` caller that is dropped while its fetch is
/// pending. The last one to leave drops the fetch.
struct HistoryWaitGuard<'a> {
    coordinator: Option<&'a QuoteSyncCoordinator>,
    key: HistoryKey,
    id: u64,
}

impl<'a> HistoryWaitGuard<'a> {
    fn new(coordinator: &'a QuoteSyncCoordinator, key: HistoryKey, id: u64) -> Self {
        Self {
            coordinator: Some(coordinator),
            key,
            id,
        }
    }

    fn disarm(mut self) {
        self.coordinator = None;
    }
}

impl Drop for HistoryWaitGuard<'_> {
    fn drop(&mut self) {
        if let Some(coordinator) = self.coordinator {
            let mut inner = coordinator.lock();
            if inner.history.abandon(&self.key, self.id) {
                debug!("History load for {} cancelled before completion", self.key);
                coordinator.publish(&inner);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    fn quote(commodity: Commodity, price: f64) -> Quote {
        Quote {
            commodity,
            price,
            change: 1.0,
            change_percent: 0.5,
            observed_at: DateTime::from_timestamp(1_700_000_000, 0),
        }
    }

    fn history_for(commodity: Commodity) -> Vec<PricePoint> {
        let base = 10.0 * (commodity.catalog_index() as f64 + 1.0);
        (1..=3)
            .map(|i| PricePoint {
                timestamp: DateTime::from_timestamp(100 * i, 0).unwrap(),
                price: base + i as f64,
            })
            .collect()
    }

    struct MockSource {
        quote_calls: AtomicUsize,
        history_calls: AtomicUsize,
        quotes: Mutex<Result<Vec<Quote>, FetchError>>,
        history_error: Mutex<Option<FetchError>>,
        quote_gate: Option<Semaphore>,
        history_gates: HashMap<Commodity, Semaphore>,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                quote_calls: AtomicUsize::new(0),
                history_calls: AtomicUsize::new(0),
                quotes: Mutex::new(Ok(vec![
                    quote(Commodity::CrudeOil, 80.0),
                    quote(Commodity::Gold, 2000.0),
                ])),
                history_error: Mutex::new(None),
                quote_gate: None,
                history_gates: HashMap::new(),
            }
        }

        fn with_quote_gate(mut self) -> Self {
            self.quote_gate = Some(Semaphore::new(0));
            self
        }

        fn with_history_gate(mut self, commodity: Commodity) -> Self {
            self.history_gates.insert(commodity, Semaphore::new(0));
            self
        }

        fn release_quotes(&self) {
            if let Some(gate) = &self.quote_gate {
                gate.add_permits(1);
            }
        }

        fn release_history(&self, commodity: Commodity) {
            if let Some(gate) = self.history_gates.get(&commodity) {
                gate.add_permits(1);
            }
        }

        fn fail_quotes(&self, error: FetchError) {
            *self.quotes.lock().unwrap() = Err(error);
        }

        fn fail_history(&self, error: FetchError) {
            *self.history_error.lock().unwrap() = Some(error);
        }

        fn quote_calls(&self) -> usize {
            self.quote_calls.load(Ordering::SeqCst)
        }

        fn history_calls(&self) -> usize {
            self.history_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataSource for MockSource {
        async fn fetch_quotes(&self) -> Result<Vec<Quote>, FetchError> {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.quote_gate {
                gate.acquire().await.unwrap().forget();
            }
            self.quotes.lock().unwrap().clone()
        }

        async fn fetch_history(
            &self,
            commodity: Commodity,
            _range: ChartRange,
        ) -> Result<Vec<PricePoint>, FetchError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = self.history_gates.get(&commodity) {
                gate.acquire().await.unwrap().forget();
            }
            match *self.history_error.lock().unwrap() {
                Some(e) => Err(e),
                None => Ok(history_for(commodity)),
            }
        }
    }

    fn coordinator_with(source: MockSource) -> (Arc<MockSource>, Arc<MemoryStore>, QuoteSyncCoordinator) {
        let source = Arc::new(source);
        let store = Arc::new(MemoryStore::new());
        let coordinator = QuoteSyncCoordinator::new(source.clone(), store.clone());
        (source, store, coordinator)
    }

    #[tokio::test]
    async fn test_refresh_success_updates_state_and_persists() {
        let (_, store, coordinator) = coordinator_with(MockSource::new());
        coordinator.refresh().await;

        let state = coordinator.state();
        assert_eq!(state.quotes.len(), 2);
        assert!(state.last_updated.is_some());
        assert!(!state.is_loading);
        assert!(state.error_message.is_none());
        assert!(state.info_message.is_none());

        let persisted = StateStore::new(store).load_snapshot().unwrap();
        assert_eq!(persisted.quotes, state.quotes);
        assert_eq!(persisted.observed_at, state.last_updated);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_fetches_once() {
        let (source, _, coordinator) = coordinator_with(MockSource::new().with_quote_gate());

        let release = async {
            assert_eq!(source.quote_calls(), 1);
            assert!(coordinator.state().is_loading);
            source.release_quotes();
        };
        tokio::join!(coordinator.refresh(), coordinator.refresh(), release);

        assert_eq!(source.quote_calls(), 1);
        assert!(!coordinator.state().is_loading);
        assert_eq!(coordinator.state().quotes.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_known_quotes() {
        let (source, _, coordinator) = coordinator_with(MockSource::new());
        coordinator.refresh().await;
        let before = coordinator.state();

        source.fail_quotes(FetchError::ServerError);
        coordinator.refresh().await;

        let after = coordinator.state();
        assert_eq!(after.quotes, before.quotes);
        assert_eq!(after.last_updated, before.last_updated);
        assert_eq!(
            after.error_message.as_deref(),
            Some(FetchError::ServerError.to_string().as_str())
        );
        assert_eq!(after.info_message.as_deref(), Some(SHOWING_LAST_KNOWN_NOTICE));
        assert!(!after.is_loading);
    }

    #[tokio::test]
    async fn test_failed_refresh_without_quotes_sets_no_info() {
        let (source, _, coordinator) = coordinator_with(MockSource::new());
        source.fail_quotes(FetchError::NetworkUnavailable);
        coordinator.refresh().await;

        let state = coordinator.state();
        assert!(state.quotes.is_empty());
        assert!(state.error_message.is_some());
        assert!(state.info_message.is_none());
    }

    #[tokio::test]
    async fn test_next_refresh_clears_previous_error() {
        let (source, _, coordinator) = coordinator_with(MockSource::new());
        source.fail_quotes(FetchError::RequestTimedOut);
        coordinator.refresh().await;
        assert!(coordinator.state().error_message.is_some());

        *source.quotes.lock().unwrap() = Ok(vec![quote(Commodity::Silver, 25.0)]);
        coordinator.refresh().await;
        let state = coordinator.state();
        assert!(state.error_message.is_none());
        assert_eq!(state.quotes, vec![quote(Commodity::Silver, 25.0)]);
    }

    #[tokio::test]
    async fn test_dropped_refresh_clears_loading_flag() {
        let (source, _, coordinator) = coordinator_with(MockSource::new().with_quote_gate());

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            coordinator.refresh(),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(!coordinator.state().is_loading);

        source.release_quotes();
        coordinator.refresh().await;
        assert_eq!(source.quote_calls(), 2);
    }

    #[tokio::test]
    async fn test_dropped_history_load_clears_loading_flag() {
        let (source, _, coordinator) =
            coordinator_with(MockSource::new().with_history_gate(Commodity::CrudeOil));

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(10),
            coordinator.load_history(Commodity::CrudeOil, ChartRange::OneMonth, false),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(!coordinator.state().is_history_loading);

        // Later publishes must not bring the flag back.
        coordinator.toggle_favorite(Commodity::Gold);
        let state = coordinator.state();
        assert!(!state.is_history_loading);
        assert_eq!(
            state.selection,
            Some(HistoryKey::new(Commodity::CrudeOil, ChartRange::OneMonth))
        );

        // The next load starts a fresh fetch.
        source.release_history(Commodity::CrudeOil);
        coordinator
            .load_history(Commodity::CrudeOil, ChartRange::OneMonth, false)
            .await;
        assert_eq!(source.history_calls(), 2);
        let state = coordinator.state();
        assert_eq!(state.visible_history, Some(history_for(Commodity::CrudeOil)));
        assert!(!state.is_history_loading);
    }

    #[tokio::test]
    async fn test_dropped_history_joiner_leaves_shared_fetch_running() {
        let (source, _, coordinator) =
            coordinator_with(MockSource::new().with_history_gate(Commodity::CrudeOil));

        let impatient = async {
            let timed_out = tokio::time::timeout(
                std::time::Duration::from_millis(10),
                coordinator.load_history(Commodity::CrudeOil, ChartRange::OneMonth, false),
            )
            .await;
            assert!(timed_out.is_err());
            assert!(coordinator.state().is_history_loading);
            source.release_history(Commodity::CrudeOil);
        };
        tokio::join!(
            impatient,
            coordinator.load_history(Commodity::CrudeOil, ChartRange::OneMonth, false),
        );

        assert_eq!(source.history_calls(), 1);
        let state = coordinator.state();
        assert_eq!(state.visible_history, Some(history_for(Commodity::CrudeOil)));
        assert!(!state.is_history_loading);
    }

    #[tokio::test]
    async fn test_restart_restores_snapshot() {
        let (source, store, coordinator) = coordinator_with(MockSource::new());
        coordinator.refresh().await;
        let before = coordinator.state();

        let restarted = QuoteSyncCoordinator::new(source, store);
        let after = restarted.state();
        assert_eq!(after.quotes, before.quotes);
        assert_eq!(after.last_updated, before.last_updated);
        assert_eq!(after.info_message.as_deref(), Some(LOADED_CACHED_NOTICE));
    }

    #[tokio::test]
    async fn test_clear_cached_quotes_survives_restart() {
        let (source, store, coordinator) = coordinator_with(MockSource::new());
        coordinator.refresh().await;
        coordinator.toggle_favorite(Commodity::Gold);
        coordinator.set_filter(Filter::FavoritesOnly);

        coordinator.clear_cached_quotes();
        let state = coordinator.state();
        assert!(state.quotes.is_empty());
        assert!(state.last_updated.is_none());
        assert_eq!(state.info_message.as_deref(), Some(CACHE_CLEARED_NOTICE));
        assert!(state.favorites.contains(&Commodity::Gold));
        assert_eq!(state.filter, Filter::FavoritesOnly);

        let restarted = QuoteSyncCoordinator::new(source, store);
        let state = restarted.state();
        assert!(state.quotes.is_empty());
        assert!(state.info_message.is_none());
        assert!(restarted.is_favorite(Commodity::Gold));
        assert_eq!(state.filter, Filter::FavoritesOnly);
    }

    #[tokio::test]
    async fn test_filter_change_does_not_refetch() {
        let (source, _, coordinator) = coordinator_with(MockSource::new());
        coordinator.refresh().await;
        coordinator.toggle_favorite(Commodity::Gold);

        coordinator.set_filter(Filter::FavoritesOnly);
        let visible = coordinator.visible_quotes();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].commodity, Commodity::Gold);
        assert_eq!(source.quote_calls(), 1);

        coordinator.set_filter(Filter::All);
        let visible = coordinator.visible_quotes();
        assert_eq!(visible[0].commodity, Commodity::Gold);
        assert_eq!(visible[1].commodity, Commodity::CrudeOil);
    }

    #[tokio::test]
    async fn test_subscribers_see_published_state() {
        let (_, _, coordinator) = coordinator_with(MockSource::new());
        let mut rx = coordinator.subscribe();

        coordinator.refresh().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().quotes.len(), 2);

        coordinator.toggle_favorite(Commodity::CrudeOil);
        assert!(rx.borrow_and_update().favorites.contains(&Commodity::CrudeOil));
    }

    #[tokio::test]
    async fn test_cached_history_is_served_without_fetch() {
        let (source, _, coordinator) = coordinator_with(MockSource::new());

        coordinator
            .load_history(Commodity::CrudeOil, ChartRange::OneMonth, false)
            .await;
        coordinator.clear_selection();
        coordinator
            .load_history(Commodity::CrudeOil, ChartRange::OneMonth, false)
            .await;

        assert_eq!(source.history_calls(), 1);
        let state = coordinator.state();
        assert_eq!(state.visible_history, Some(history_for(Commodity::CrudeOil)));
        assert!(state.history_error.is_none());

        coordinator
            .load_history(Commodity::CrudeOil, ChartRange::OneMonth, true)
            .await;
        assert_eq!(source.history_calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_history_loads_share_one_fetch() {
        let (source, _, coordinator) =
            coordinator_with(MockSource::new().with_history_gate(Commodity::CrudeOil));

        let release = async {
            assert_eq!(source.history_calls(), 1);
            assert!(coordinator.state().is_history_loading);
            source.release_history(Commodity::CrudeOil);
        };
        tokio::join!(
            coordinator.load_history(Commodity::CrudeOil, ChartRange::OneMonth, false),
            coordinator.load_history(Commodity::CrudeOil, ChartRange::OneMonth, false),
            release,
        );

        assert_eq!(source.history_calls(), 1);
        let state = coordinator.state();
        assert_eq!(state.visible_history, Some(history_for(Commodity::CrudeOil)));
        assert!(!state.is_history_loading);
    }

    #[tokio::test]
    async fn test_late_history_response_does_not_replace_selection() {
        let (source, _, coordinator) =
            coordinator_with(MockSource::new().with_history_gate(Commodity::CrudeOil));

        let switch_to_gold = async {
            coordinator
                .load_history(Commodity::Gold, ChartRange::OneYear, false)
                .await;
            assert_eq!(
                coordinator.state().visible_history,
                Some(history_for(Commodity::Gold))
            );
            source.release_history(Commodity::CrudeOil);
        };
        tokio::join!(
            coordinator.load_history(Commodity::CrudeOil, ChartRange::OneMonth, false),
            switch_to_gold,
        );

        let state = coordinator.state();
        assert_eq!(
            state.selection,
            Some(HistoryKey::new(Commodity::Gold, ChartRange::OneYear))
        );
        assert_eq!(state.visible_history, Some(history_for(Commodity::Gold)));

        // The late oil response was cached for later reuse.
        coordinator
            .load_history(Commodity::CrudeOil, ChartRange::OneMonth, false)
            .await;
        assert_eq!(source.history_calls(), 2);
        assert_eq!(
            coordinator.state().visible_history,
            Some(history_for(Commodity::CrudeOil))
        );
    }

    #[tokio::test]
    async fn test_history_failure_keeps_cached_series() {
        let (source, _, coordinator) = coordinator_with(MockSource::new());
        coordinator
            .load_history(Commodity::Silver, ChartRange::OneWeek, false)
            .await;

        source.fail_history(FetchError::RequestTimedOut);
        coordinator
            .load_history(Commodity::Silver, ChartRange::OneWeek, true)
            .await;

        let state = coordinator.state();
        assert_eq!(state.visible_history, Some(history_for(Commodity::Silver)));
        assert_eq!(
            state.history_error.as_deref(),
            Some(FetchError::RequestTimedOut.to_string().as_str())
        );
        assert!(!state.is_history_loading);
    }

    #[tokio::test]
    async fn test_history_failure_for_other_selection_sets_no_error() {
        let (source, _, coordinator) =
            coordinator_with(MockSource::new().with_history_gate(Commodity::NaturalGas));
        source.fail_history(FetchError::EmptyHistory);

        let move_away = async {
            coordinator.clear_selection();
            source.release_history(Commodity::NaturalGas);
        };
        tokio::join!(
            coordinator.load_history(Commodity::NaturalGas, ChartRange::OneDay, false),
            move_away,
        );

        let state = coordinator.state();
        assert!(state.selection.is_none());
        assert!(state.visible_history.is_none());
        assert!(state.history_error.is_none());
    }
}
