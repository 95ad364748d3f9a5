//! Core domain types and collaborator contracts

pub mod catalog;
pub mod config;
pub mod error;
pub mod log;
pub mod quote;
pub mod store;

// Re-export main types for cleaner imports
pub use catalog::{ChartRange, Commodity};
pub use error::FetchError;
pub use quote::{CacheSnapshot, DataSource, PricePoint, Quote};
pub use store::{KeyValueStore, StateStore};
