//! Record storage behind the permit service.
//!
//! Stores hold versioned JSON rows grouped into tables. Writers read a row,
//! compute the next value and hand back the version they read; the store
//! refuses the write if the row has moved on since.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::workflow::{Permit, Worker};

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// A type that can live in a store table.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
    /// Entity name used in not-found errors.
    const KIND: &'static str;
    fn id(&self) -> &str;
}

impl Record for Permit {
    const TABLE: &'static str = "permits";
    const KIND: &'static str = "permit";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Worker {
    const TABLE: &'static str = "workers";
    const KIND: &'static str = "worker";
    fn id(&self) -> &str {
        &self.id
    }
}

/// A record together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait RecordStore: Send + Sync {
    fn get<R: Record>(&self, id: &str) -> impl Future<Output = StoreResult<Versioned<R>>> + Send;

    /// Insert a new record at version 1.
    fn insert<R: Record>(&self, record: &R) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Replace a record only if it is still at `expected`; returns the new version.
    fn compare_and_swap<R: Record>(
        &self,
        expected: u64,
        record: &R,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    fn list<R: Record>(&self) -> impl Future<Output = StoreResult<Vec<R>>> + Send;

    /// Next value of a named counter, starting at 1.
    fn next_id(&self, sequence: &str) -> impl Future<Output = StoreResult<u64>> + Send;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    version: u64,
    data: Value,
}

/// In-memory layout shared by every store implementation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Tables {
    #[serde(default)]
    tables: BTreeMap<String, BTreeMap<String, Row>>,
    #[serde(default)]
    sequences: BTreeMap<String, u64>,
}

impl Tables {
    fn get<R: Record>(&self, id: &str) -> StoreResult<Versioned<R>> {
        let row = self
            .tables
            .get(R::TABLE)
            .and_then(|t| t.get(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(Versioned {
            version: row.version,
            value: serde_json::from_value(row.data.clone())?,
        })
    }

    fn insert<R: Record>(&mut self, record: &R) -> StoreResult<u64> {
        let data = serde_json::to_value(record)?;
        let table = self.tables.entry(R::TABLE.to_string()).or_default();
        if table.contains_key(record.id()) {
            return Err(StoreError::AlreadyExists(record.id().to_string()));
        }
        table.insert(record.id().to_string(), Row { version: 1, data });
        Ok(1)
    }

    fn compare_and_swap<R: Record>(&mut self, expected: u64, record: &R) -> StoreResult<u64> {
        let data = serde_json::to_value(record)?;
        let row = self
            .tables
            .get_mut(R::TABLE)
            .and_then(|t| t.get_mut(record.id()))
            .ok_or_else(|| StoreError::NotFound(record.id().to_string()))?;
        if row.version != expected {
            return Err(StoreError::Conflict {
                id: record.id().to_string(),
                expected,
                found: row.version,
            });
        }
        row.version += 1;
        row.data = data;
        Ok(row.version)
    }

    fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        let Some(table) = self.tables.get(R::TABLE) else {
            return Ok(Vec::new());
        };
        table
            .values()
            .map(|row| serde_json::from_value(row.data.clone()).map_err(StoreError::from))
            .collect()
    }

    fn next_id(&mut self, sequence: &str) -> u64 {
        let counter = self.sequences.entry(sequence.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }
}
