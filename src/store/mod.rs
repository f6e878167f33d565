pub mod json_file;
pub mod memory;

use crate::error::StoreError;
use crate::types::StoredRecord;
use async_trait::async_trait;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// Durable persistence for reconciled records. One read at run start, one
/// atomic full-dataset write at run end; the reconciler never writes here
/// directly.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Read the current store snapshot.
    async fn load(&self) -> Result<Vec<StoredRecord>, StoreError>;

    /// Replace the full dataset with the given snapshot, atomically.
    async fn save(&self, records: &[StoredRecord]) -> Result<(), StoreError>;
}
