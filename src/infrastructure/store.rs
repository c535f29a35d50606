//! Key-value storage and the positional entry log built on top of it
//!
//! Entries are persisted as an append-only log addressed by position:
//!
//! ```toml
//! EntryCount = 2
//! EntryDate_0 = "Monday, 1 January"
//! EntryContent_0 = "Today was a good day."
//! EntryDate_1 = "Tuesday, 2 January"
//! EntryContent_1 = "It rained."
//! ```
//!
//! There is no update-by-date and no deletion. Readers must scan.

use crate::domain::Entry;
use crate::error::{DiaryError, Result};
use crate::infrastructure::config::DIARY_DIR;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const ENTRY_COUNT_KEY: &str = "EntryCount";

/// File name of the entry store inside the diary directory
pub const STORE_FILE: &str = "DiaryEntries.toml";

fn date_key(index: i64) -> String {
    format!("EntryDate_{}", index)
}

fn content_key(index: i64) -> String {
    format!("EntryContent_{}", index)
}

/// A single stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Int(i64),
    Text(String),
}

/// Writes applied together by [`KeyValueStore::commit`]
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<(String, StoredValue)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.writes.push((key.into(), StoredValue::Int(value)));
        self
    }

    pub fn put_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.writes.push((key.into(), StoredValue::Text(value.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Durable flat key-value storage
///
/// `commit` must apply a whole batch or nothing: a reader never observes
/// part of a batch.
pub trait KeyValueStore {
    fn get_int(&self, key: &str) -> Result<Option<i64>>;

    fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Every key-value pair, read as one consistent view
    fn read_all(&self) -> Result<BTreeMap<String, StoredValue>>;

    fn commit(&self, batch: WriteBatch) -> Result<()>;
}

/// TOML-file implementation of [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: PathBuf) -> Self {
        FileKeyValueStore { path }
    }

    /// Store at `.aidiary/DiaryEntries.toml` under a diary root
    pub fn in_diary(root: &Path) -> Self {
        Self::new(root.join(DIARY_DIR).join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        Ok(contents.parse::<toml::Table>()?)
    }

    /// Write to a temp sibling and rename over the target.
    ///
    /// On Windows, `rename` does not overwrite existing files, so we remove the destination first.
    fn write_table_atomic(&self, table: &toml::Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = toml::to_string(table)?;
        let tmp_name = format!(
            "{}.tmp-{}",
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or(STORE_FILE),
            std::process::id()
        );
        let tmp_path = self.path.with_file_name(tmp_name);

        fs::write(&tmp_path, contents)?;

        if cfg!(windows) && self.path.exists() {
            fs::remove_file(&self.path)?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.read_table()?.get(key).and_then(|v| v.as_integer()))
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .read_table()?
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string))
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredValue>> {
        Ok(self
            .read_table()?
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    toml::Value::Integer(i) => StoredValue::Int(i),
                    toml::Value::String(s) => StoredValue::Text(s),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut table = self.read_table()?;

        for (key, value) in batch.writes {
            let value = match value {
                StoredValue::Int(i) => toml::Value::Integer(i),
                StoredValue::Text(s) => toml::Value::String(s),
            };
            table.insert(key, value);
        }

        self.write_table_atomic(&table)
    }
}

/// In-process [`KeyValueStore`]; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<Mutex<BTreeMap<String, StoredValue>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent commit fail with an IO error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the raw key-value pairs
    pub fn snapshot(&self) -> BTreeMap<String, StoredValue> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn get(&self, key: &str) -> Option<StoredValue> {
        self.values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_int(&self, key: &str) -> Result<Option<i64>> {
        Ok(match self.get(key) {
            Some(StoredValue::Int(i)) => Some(i),
            _ => None,
        })
    }

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(match self.get(key) {
            Some(StoredValue::Text(s)) => Some(s),
            _ => None,
        })
    }

    fn read_all(&self) -> Result<BTreeMap<String, StoredValue>> {
        Ok(self.snapshot())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DiaryError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "write rejected",
            )));
        }

        let mut values = self
            .values
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        values.extend(batch.writes);
        Ok(())
    }
}

/// Append-only positional log of diary entries
#[derive(Debug, Clone)]
pub struct PersistentEntryStore<S> {
    store: S,
}

impl<S: KeyValueStore> PersistentEntryStore<S> {
    pub fn new(store: S) -> Self {
        PersistentEntryStore { store }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    /// Number of records ever appended, as stored
    pub fn record_count(&self) -> i64 {
        match self.store.get_int(ENTRY_COUNT_KEY) {
            Ok(count) => count.unwrap_or(0).max(0),
            Err(e) => {
                warn!("Failed to read entry count: {}", e);
                0
            }
        }
    }

    /// Read every record in position order.
    ///
    /// Never fails: unreadable storage is treated as holding no entries and
    /// missing fields read as empty strings. All records come from a single
    /// read of the store.
    pub fn load_all(&self) -> Vec<Entry> {
        let values = match self.store.read_all() {
            Ok(values) => values,
            Err(e) => {
                warn!("Failed to read entry store: {}", e);
                return Vec::new();
            }
        };

        let count = match values.get(ENTRY_COUNT_KEY) {
            Some(StoredValue::Int(count)) => (*count).max(0),
            _ => 0,
        };
        let text = |key: String| match values.get(&key) {
            Some(StoredValue::Text(s)) => s.clone(),
            _ => String::new(),
        };

        (0..count)
            .map(|i| Entry::new(text(date_key(i)), text(content_key(i))))
            .collect()
    }

    /// Append one record as a single committed batch
    pub fn append(&self, entry: &Entry) -> Result<()> {
        let count = self.store.get_int(ENTRY_COUNT_KEY)?.unwrap_or(0).max(0);

        let batch = WriteBatch::new()
            .put_string(date_key(count), entry.date.as_str())
            .put_string(content_key(count), entry.content.as_str())
            .put_int(ENTRY_COUNT_KEY, count + 1);

        self.store.commit(batch)?;
        debug!("Appended entry record {} for {}", count, entry.date);
        Ok(())
    }
}
