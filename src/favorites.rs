use crate::core::StateStore;
use crate::core::catalog::Commodity;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Favorited commodities, written through to the store on every change.
pub struct FavoritesRegistry {
    favorites: HashSet<Commodity>,
    store: StateStore,
}

impl FavoritesRegistry {
    pub fn load(store: StateStore) -> Self {
        let favorites = store.load_favorites();
        debug!(count = favorites.len(), "Loaded favorites");
        Self { favorites, store }
    }

    pub fn is_favorite(&self, commodity: Commodity) -> bool {
        self.favorites.contains(&commodity)
    }

    /// Adds or removes `commodity` and returns whether it is now a favorite.
    pub fn toggle(&mut self, commodity: Commodity) -> bool {
        let now_favorite = if self.favorites.remove(&commodity) {
            false
        } else {
            self.favorites.insert(commodity);
            true
        };

        if let Err(e) = self.store.save_favorites(&self.favorites) {
            warn!(error = %e, "Failed to persist favorites");
        }
        debug!(%commodity, now_favorite, "Toggled favorite");
        now_favorite
    }

    pub fn as_set(&self) -> &HashSet<Commodity> {
        &self.favorites
    }
}
