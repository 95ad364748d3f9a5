//! Derives the quote list to display from quotes, filter and favorites.

use crate::core::Quote;
use crate::core::catalog::Commodity;
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    #[serde(rename = "favorites")]
    FavoritesOnly,
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::FavoritesOnly => write!(f, "favorites"),
        }
    }
}

impl FromStr for Filter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "favorites" | "favourites" | "fav" => Ok(Filter::FavoritesOnly),
            _ => Err(anyhow!("Invalid filter: {} (expected 'all' or 'favorites')", s)),
        }
    }
}

/// Favorites first, then by display name; catalog order breaks remaining ties.
pub fn project(quotes: &[Quote], filter: Filter, favorites: &HashSet<Commodity>) -> Vec<Quote> {
    let mut visible: Vec<Quote> = quotes
        .iter()
        .filter(|q| filter == Filter::All || favorites.contains(&q.commodity))
        .cloned()
        .collect();

    visible.sort_by_key(|q| {
        (
            Reverse(favorites.contains(&q.commodity)),
            q.commodity.display_name(),
            q.commodity.catalog_index(),
        )
    });
    visible
}
