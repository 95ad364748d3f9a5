pub mod disk;
pub mod memory;

use crate::core::store::KeyValueStore;
use disk::DiskStore;
use memory::MemoryStore;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Opens the disk store under `data_path`, falling back to an in-memory store
/// when the disk store cannot be opened.
pub fn open_store(data_path: Option<&Path>) -> Arc<dyn KeyValueStore> {
    let Some(path) = data_path else {
        warn!("No data directory available, cached prices will not be kept");
        return Arc::new(MemoryStore::new());
    };

    match DiskStore::open(&path.join("store")) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Failed to open disk store, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}
