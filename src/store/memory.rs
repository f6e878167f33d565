use crate::error::StoreError;
use crate::store::StoreClient;
use crate::types::StoredRecord;
use async_trait::async_trait;
use std::sync::Mutex;

/// In-memory store implementation for development/testing.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<StoredRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Snapshot of what the last save wrote, for assertions.
    pub fn snapshot(&self) -> Vec<StoredRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn load(&self) -> Result<Vec<StoredRecord>, StoreError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn save(&self, records: &[StoredRecord]) -> Result<(), StoreError> {
        *self.records.lock().unwrap() = records.to_vec();
        Ok(())
    }
}
