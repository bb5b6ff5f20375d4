use crate::error::StoreError;
use backfill_models::{DisambiguationRecord, ImportedEpisodeRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Remembered answers to "which of these shows did you mean?".
pub trait DisambiguationStore: Send + Sync {
    fn lookup(&self, show_name: &str) -> Result<Option<DisambiguationRecord>, StoreError>;

    fn record_skip(&self, show_name: &str) -> Result<(), StoreError>;

    fn record_selection(&self, show_name: &str, selected_index: usize) -> Result<(), StoreError>;
}

/// Episode ids already written to the target service.
pub trait ImportLedger: Send + Sync {
    fn contains(&self, episode_id: &str) -> Result<bool, StoreError>;

    fn record(&self, episode_id: &str) -> Result<(), StoreError>;
}

/// A pretty-printed JSON object of string keys to records.
///
/// The file is read fresh on every access so edits made by hand between
/// runs are always seen, and each insert rewrites it through a temp file
/// and a rename.
pub struct JsonTable<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonTable<R>
where
    R: Serialize + DeserializeOwned,
{
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, R>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        // An operator emptying the file by hand resets the table
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, table: &BTreeMap<String, R>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(table).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<R>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read_all()?.contains_key(key))
    }

    /// Insert unless the key is already present. Returns whether a write happened.
    pub fn insert_new(&self, key: &str, record: R) -> Result<bool, StoreError> {
        let mut table = self.read_all()?;
        if table.contains_key(key) {
            return Ok(false);
        }
        table.insert(key.to_string(), record);
        self.write_all(&table)?;
        Ok(true)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// `matched_shows.json`: show display name to the recorded decision.
pub struct JsonDisambiguationStore {
    table: JsonTable<DisambiguationRecord>,
}

impl JsonDisambiguationStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { table: JsonTable::open(path) }
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    fn insert(&self, record: DisambiguationRecord) -> Result<(), StoreError> {
        let key = record.show_name.clone();
        if !self.table.insert_new(&key, record)? {
            warn!(
                "'{}' already has a recorded decision in {}; keeping the existing one",
                key,
                self.table.path().display()
            );
        }
        Ok(())
    }
}

impl DisambiguationStore for JsonDisambiguationStore {
    fn lookup(&self, show_name: &str) -> Result<Option<DisambiguationRecord>, StoreError> {
        self.table.get(show_name)
    }

    fn record_skip(&self, show_name: &str) -> Result<(), StoreError> {
        self.insert(DisambiguationRecord::skipped(show_name))
    }

    fn record_selection(&self, show_name: &str, selected_index: usize) -> Result<(), StoreError> {
        self.insert(DisambiguationRecord::selection(show_name, selected_index))
    }
}

/// `imported_episodes.json`: synthetic episode id to import time.
pub struct JsonImportLedger {
    table: JsonTable<ImportedEpisodeRecord>,
}

impl JsonImportLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { table: JsonTable::open(path) }
    }

    pub fn path(&self) -> &Path {
        self.table.path()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.table.len()
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.table.is_empty()
    }
}

impl ImportLedger for JsonImportLedger {
    fn contains(&self, episode_id: &str) -> Result<bool, StoreError> {
        self.table.contains_key(episode_id)
    }

    fn record(&self, episode_id: &str) -> Result<(), StoreError> {
        if !self.table.insert_new(episode_id, ImportedEpisodeRecord::now(episode_id))? {
            debug!("Episode {} was already in the ledger", episode_id);
        }
        Ok(())
    }
}
