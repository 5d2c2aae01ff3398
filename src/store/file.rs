use std::path::PathBuf;

use tokio::sync::Mutex;

use super::{Record, RecordStore, StoreResult, Tables, Versioned};

/// Store backed by a single JSON document on disk.
///
/// Every operation loads the document, applies the change and writes it back
/// under one mutex, so read-modify-write cycles on this handle never
/// interleave. Writes go to a sibling temp file first and are renamed into
/// place.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> StoreResult<Tables> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Tables::default()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Tables::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, tables: &Tables) -> StoreResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(tables)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    async fn get<R: Record>(&self, id: &str) -> StoreResult<Versioned<R>> {
        let _guard = self.lock.lock().await;
        self.load().await?.get(id)
    }

    async fn insert<R: Record>(&self, record: &R) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let version = tables.insert(record)?;
        self.save(&tables).await?;
        Ok(version)
    }

    async fn compare_and_swap<R: Record>(&self, expected: u64, record: &R) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let version = tables.compare_and_swap(expected, record)?;
        self.save(&tables).await?;
        Ok(version)
    }

    async fn list<R: Record>(&self) -> StoreResult<Vec<R>> {
        let _guard = self.lock.lock().await;
        self.load().await?.list()
    }

    async fn next_id(&self, sequence: &str) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let mut tables = self.load().await?;
        let id = tables.next_id(sequence);
        self.save(&tables).await?;
        Ok(id)
    }
}
