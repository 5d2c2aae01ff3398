use tokio::sync::RwLock;

use super::{Record, RecordStore, StoreResult, Tables, Versioned};

/// Process-local store. Each call holds the table lock for its whole
/// read or write, so a compare-and-swap is atomic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    async fn get<R: Record>(&self, id: &str) -> StoreResult<Versioned<R>> {
        self.tables.read().await.get(id)
    }

    async fn insert<R: Record>(&self, record: &R) -> StoreResult<u64> {
        self.tables.write().await.insert(record)
    }

    async fn compare_and_swap<R: Record>(&self, expected: u64, record: &R) -> StoreResult<u64> {
        self.tables.write().await.compare_and_swap(expected, record)
    }

    async fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        self.tables.read().await.list()
    }

    async fn next_id(&self, sequence: &str) -> StoreResult<u64> {
        Ok(self.tables.write().await.next_id(sequence))
    }
}
